//! Auth Middleware
//!
//! Session middleware resolves a token from the `Authorization: Bearer`
//! header first, then the access cookie, verifies it against the access
//! secret and loads the user. The required variant rejects; the optional
//! variant swallows every failure and proceeds without an identity.
//!
//! The authorization gate is a pure function of the attached identity and
//! the required capability.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::application::config::ACCESS_TOKEN_COOKIE;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_id::UserId;
use crate::domain::value_object::user_role::Capability;
use crate::error::{AuthError, AuthResult};
use crate::presentation::handlers::AppState;

/// Authenticated identity attached to the request by [`require_auth`]
/// or [`optional_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Resolve the token: Bearer header first, access cookie second
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        if let Some(token) = value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
            return Some(token.to_string());
        }
    }

    platform::cookie::extract_cookie(headers, ACCESS_TOKEN_COOKIE)
}

/// Verify the token and load the matching live user
async fn resolve_user<R>(state: &AppState<R>, headers: &HeaderMap) -> AuthResult<User>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = extract_token(headers).ok_or(AuthError::MissingToken)?;

    let claims = state.tokens.verify_access(&token)?;

    let user_id = claims
        .sub
        .parse::<Uuid>()
        .map(UserId::from_uuid)
        .map_err(|_| AuthError::InvalidToken)?;

    let user = state
        .repo
        .find_by_id(&user_id)
        .await?
        .ok_or(AuthError::Unauthenticated)?;

    if !user.is_active {
        return Err(AuthError::AccountDisabled);
    }

    if user.is_locked() {
        return Err(AuthError::AccountLocked);
    }

    Ok(user)
}

/// Middleware that requires a valid authenticated user
pub async fn require_auth<R>(
    State(state): State<AppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let user = resolve_user(&state, req.headers()).await?;

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware that attaches an identity when possible but never fails
pub async fn optional_auth<R>(
    State(state): State<AppState<R>>,
    mut req: Request<Body>,
    next: Next,
) -> Response
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    match resolve_user(&state, req.headers()).await {
        Ok(user) => {
            req.extensions_mut().insert(CurrentUser(user));
        }
        Err(e) => {
            tracing::debug!(error = %e, "Optional authentication not applied");
        }
    }

    next.run(req).await
}

/// Authorization gate layered inside [`require_auth`]
///
/// 401 without an identity, 403 when the identity's role lacks the
/// capability. No store access.
pub async fn authorize(
    capability: Capability,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::Unauthenticated)?;

    if !user.0.role.has(capability) {
        tracing::warn!(
            user_id = %user.0.user_id,
            role = %user.0.role,
            ?capability,
            "Capability denied"
        );
        return Err(AuthError::Forbidden);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("accessToken=cookie-token"),
        );

        assert_eq!(extract_token(&headers), Some("header-token".to_string()));
    }

    #[test]
    fn test_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("accessToken=cookie-token"),
        );

        assert_eq!(extract_token(&headers), Some("cookie-token".to_string()));
    }

    #[test]
    fn test_no_token() {
        let headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        // A non-bearer Authorization header does not fall back to nothing
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(extract_token(&headers), None);
    }
}

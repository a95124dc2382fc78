//! Refresh Token Use Case
//!
//! Mints a fresh token pair from a valid refresh token. The presented
//! token must verify under the refresh secret and carry the refresh kind
//! claim; the account is re-checked so a deactivated or locked user
//! cannot keep refreshing.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Refresh use case
pub struct RefreshUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenService>,
}

impl<R> RefreshUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenService>) -> Self {
        Self { repo, tokens }
    }

    pub async fn execute(&self, refresh_token: &str) -> AuthResult<(User, TokenPair)> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let user_id = claims
            .sub
            .parse::<Uuid>()
            .map(UserId::from_uuid)
            .map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .repo
            .find_by_id(&user_id)
            .await?
            .filter(|u| u.is_active && !u.is_locked())
            .ok_or(AuthError::Unauthenticated)?;

        let tokens = self.tokens.issue_pair(&user.user_id)?;

        tracing::debug!(user_id = %user.user_id, "Token pair refreshed");

        Ok((user, tokens))
    }
}

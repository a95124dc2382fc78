//! Auth Route Handlers
//!
//! Register/login/logout/refresh/me plus the password-reset and
//! email-verification flows. Every success goes out in the common
//! envelope; failures are `AuthError` values rendered by the kernel.

use axum::Json;
use axum::extract::{Extension, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use platform::cookie::extract_cookie;

use crate::application::config::REFRESH_TOKEN_COOKIE;
use crate::application::{
    ForgotPasswordUseCase, LoginUseCase, RefreshUseCase, RegisterUseCase, ResetPasswordUseCase,
    VerifyEmailUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    ApiResponse, AuthData, CheckEmailData, CheckEmailRequest, ForgotPasswordRequest,
    LoginRequest, PublicUser, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest,
    UserData, VerifyEmailRequest,
};
use crate::presentation::extract::ApiJson;
use crate::presentation::handlers::{AppState, clear_token_cookies, set_token_cookies};
use crate::presentation::middleware::CurrentUser;
use crate::presentation::validation;

/// POST /auth/register
pub async fn register<R>(
    State(state): State<AppState<R>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let input = validation::validate_register(req)?;

    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.tokens.clone(),
    );
    let output = use_case.execute(input).await?;

    let cookies = set_token_cookies(&state.config, &output.tokens);

    Ok((
        StatusCode::CREATED,
        cookies,
        Json(ApiResponse::success_with_message(
            "User registered successfully",
            AuthData {
                user: PublicUser::from(&output.user),
                access_token: output.tokens.access_token.clone(),
            },
        )),
    ))
}

/// POST /auth/login
pub async fn login<R>(
    State(state): State<AppState<R>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let input = validation::validate_login(req)?;

    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.config.clone(),
        state.tokens.clone(),
    );
    let output = use_case.execute(input).await?;

    let cookies = set_token_cookies(&state.config, &output.tokens);

    Ok((
        StatusCode::OK,
        cookies,
        Json(ApiResponse::success_with_message(
            "Login successful",
            AuthData {
                user: PublicUser::from(&output.user),
                access_token: output.tokens.access_token.clone(),
            },
        )),
    ))
}

/// POST /auth/logout (requires authentication)
pub async fn logout<R>(State(state): State<AppState<R>>) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let cookies = clear_token_cookies(&state.config);

    Ok((
        StatusCode::OK,
        cookies,
        Json(ApiResponse::message("Logout successful")),
    ))
}

/// POST /auth/refresh-token
///
/// The refresh token comes from its cookie or, failing that, the body.
pub async fn refresh_token<R>(
    State(state): State<AppState<R>>,
    headers: HeaderMap,
    body: Option<ApiJson<RefreshTokenRequest>>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = extract_cookie(&headers, REFRESH_TOKEN_COOKIE)
        .or_else(|| body.and_then(|ApiJson(req)| req.refresh_token))
        .ok_or(AuthError::MissingToken)?;

    let use_case = RefreshUseCase::new(state.repo.clone(), state.tokens.clone());
    let (user, tokens) = use_case.execute(&token).await?;

    let cookies = set_token_cookies(&state.config, &tokens);

    Ok((
        StatusCode::OK,
        cookies,
        Json(ApiResponse::success_with_message(
            "Token refreshed successfully",
            AuthData {
                user: PublicUser::from(&user),
                access_token: tokens.access_token.clone(),
            },
        )),
    ))
}

/// GET /auth/me (requires authentication)
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AuthResult<Json<ApiResponse<UserData>>> {
    Ok(Json(ApiResponse::success(UserData {
        user: PublicUser::from(&user),
    })))
}

/// POST /auth/forgot-password
///
/// Responds identically whether or not the account exists.
pub async fn forgot_password<R>(
    State(state): State<AppState<R>>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> AuthResult<Json<ApiResponse<()>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let email = validation::validate_forgot_password(req)?;

    let use_case = ForgotPasswordUseCase::new(state.repo.clone());
    // The token (if any) is delivered by the email stub inside the use case
    let _ = use_case.execute(&email).await?;

    Ok(Json(ApiResponse::message(
        "If an account with that email exists, password reset instructions have been sent",
    )))
}

/// POST /auth/reset-password
pub async fn reset_password<R>(
    State(state): State<AppState<R>>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> AuthResult<Json<ApiResponse<()>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let (token, password) = validation::validate_reset_password(req)?;

    let use_case = ResetPasswordUseCase::new(state.repo.clone(), state.config.clone());
    use_case.execute(&token, password).await?;

    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// POST /auth/verify-email
pub async fn verify_email<R>(
    State(state): State<AppState<R>>,
    ApiJson(req): ApiJson<VerifyEmailRequest>,
) -> AuthResult<Json<ApiResponse<()>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let token = validation::validate_verify_email(req)?;

    let use_case = VerifyEmailUseCase::new(state.repo.clone());
    use_case.verify(&token).await?;

    Ok(Json(ApiResponse::message("Email verified successfully")))
}

/// POST /auth/resend-verification (requires authentication)
pub async fn resend_verification<R>(
    State(state): State<AppState<R>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AuthResult<Json<ApiResponse<()>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let use_case = VerifyEmailUseCase::new(state.repo.clone());
    // Delivered by the email stub inside the use case
    let _ = use_case.resend(&user).await?;

    Ok(Json(ApiResponse::message(
        "A new verification link has been sent",
    )))
}

/// POST /auth/check-email
pub async fn check_email<R>(
    State(state): State<AppState<R>>,
    ApiJson(req): ApiJson<CheckEmailRequest>,
) -> AuthResult<Json<ApiResponse<CheckEmailData>>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let email = validation::validate_check_email(req)?;

    let taken = state.repo.exists_by_email(&email).await?;

    Ok(Json(ApiResponse::success(CheckEmailData {
        available: !taken,
    })))
}

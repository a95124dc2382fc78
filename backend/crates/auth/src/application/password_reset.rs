//! Password Reset Use Cases
//!
//! Forgot-password stores only the SHA-256 of the generated token with a
//! short expiry; reset-password re-hashes the presented token and matches
//! it against the store with an unexpired-window constraint. Consuming a
//! token clears the reset fields, so each token works exactly once.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Reset token validity window
pub const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Forgot-password use case
pub struct ForgotPasswordUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> ForgotPasswordUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Start a reset window for the account, if it exists
    ///
    /// Returns the raw token for delivery by the caller (the email stub
    /// logs it), or `None` when no account matches. The handler responds
    /// identically in both cases.
    pub async fn execute(&self, email: &Email) -> AuthResult<Option<String>> {
        let Some(mut user) = self.repo.find_by_email(email).await? else {
            tracing::debug!("Password reset requested for an unknown email");
            return Ok(None);
        };

        let token = platform::crypto::random_token_hex(32);
        let token_hash = platform::crypto::sha256_hex(token.as_bytes());
        let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        user.start_password_reset(token_hash, expires);
        self.repo.update(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            email = %user.email,
            reset_token = %token,
            "Password reset email queued"
        );

        Ok(Some(token))
    }
}

/// Reset-password use case
pub struct ResetPasswordUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Consume a reset token and replace the password
    pub async fn execute(&self, token: &str, new_password: RawPassword) -> AuthResult<()> {
        let token_hash = platform::crypto::sha256_hex(token.as_bytes());

        let mut user = self
            .repo
            .find_by_reset_token_hash(&token_hash, Utc::now())
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let password_hash = UserPassword::from_raw(&new_password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        user.set_password(password_hash);
        user.clear_password_reset();
        self.repo.update(&user).await?;

        // A successful reset also forgives any lockout
        self.repo.reset_login_attempts(&user.user_id).await?;

        tracing::info!(user_id = %user.user_id, "Password reset completed");

        Ok(())
    }
}

//! Email Verification Use Case
//!
//! Verification tokens are plain random values matched by direct lookup.
//! Unlike reset tokens they are not hashed at rest; the asymmetry is kept
//! for compatibility with existing clients of the verification links.

use std::sync::Arc;

use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};

/// Email verification use case
pub struct VerifyEmailUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Consume a verification token
    pub async fn verify(&self, token: &str) -> AuthResult<()> {
        let mut user = self
            .repo
            .find_by_verification_token(token)
            .await?
            .ok_or(AuthError::InvalidVerificationToken)?;

        user.mark_email_verified();
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Email verified");

        Ok(())
    }

    /// Issue a fresh verification token for an unverified account
    ///
    /// Returns the new token for delivery by the caller (the email stub
    /// logs it).
    pub async fn resend(&self, user: &User) -> AuthResult<String> {
        if user.is_email_verified {
            return Err(AuthError::EmailAlreadyVerified);
        }

        let token = platform::crypto::random_token_hex(32);

        let mut user = user.clone();
        user.set_verification_token(token.clone());
        self.repo.update(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            email = %user.email,
            verification_token = %token,
            "Verification email re-queued"
        );

        Ok(token)
    }
}

//! Login Use Case
//!
//! Authenticates a user by email and password and drives the lockout
//! state machine on failures. Lookup misses and password mismatches are
//! indistinguishable to the caller.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: Email,
    pub password: String,
    /// Accepted for client compatibility; token lifetimes are fixed
    pub remember_me: bool,
}

/// Login output
pub struct LoginOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Login use case
pub struct LoginUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    tokens: Arc<TokenService>,
}

impl<R> LoginUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>, tokens: Arc<TokenService>) -> Self {
        Self {
            repo,
            config,
            tokens,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let user = self
            .repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // An active lock rejects before the password is even compared
        if user.is_locked() {
            return Err(AuthError::AccountLocked);
        }

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        // No policy on verification: wrong candidates of any shape drive
        // the lockout machine the same way.
        let candidate = RawPassword::for_verification(input.password);

        if !user.password_hash.verify(&candidate, self.config.pepper()) {
            let state = self
                .repo
                .record_failed_login(&user.user_id, Utc::now())
                .await?;

            tracing::warn!(
                user_id = %user.user_id,
                attempts = state.login_attempts,
                locked = state.lock_until.is_some(),
                "Failed login attempt"
            );

            return Err(AuthError::InvalidCredentials);
        }

        if user.login_attempts > 0 || user.lock_until.is_some() {
            self.repo.reset_login_attempts(&user.user_id).await?;
        }

        let mut user = user;
        user.login_attempts = 0;
        user.lock_until = None;
        user.record_login();
        self.repo.update(&user).await?;

        let tokens = self.tokens.issue_pair(&user.user_id)?;

        tracing::info!(
            user_id = %user.user_id,
            remember_me = input.remember_me,
            "User logged in"
        );

        Ok(LoginOutput { user, tokens })
    }
}

//! Register Use Case
//!
//! Creates a new storefront account and issues the first token pair.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::{TokenPair, TokenService};
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    email::Email, person_name::PersonName, phone::Phone, user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Validated registration input
#[derive(Debug)]
pub struct RegisterInput {
    pub email: Email,
    pub password: RawPassword,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<Phone>,
}

/// Registration output
pub struct RegisterOutput {
    pub user: User,
    pub tokens: TokenPair,
}

/// Register use case
pub struct RegisterUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
    tokens: Arc<TokenService>,
}

impl<R> RegisterUseCase<R>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        // Friendly pre-check; the store's uniqueness constraint still backs
        // the concurrent-registration race via `create`.
        if self.repo.exists_by_email(&input.email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&input.password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let verification_token = platform::crypto::random_token_hex(32);

        let user = User::new(
            input.email,
            password_hash,
            input.first_name,
            input.last_name,
            input.phone,
            verification_token.clone(),
        );

        self.repo.create(&user).await?;

        // Email delivery is stubbed: the token goes to the log only.
        tracing::info!(
            user_id = %user.user_id,
            email = %user.email,
            verification_token = %verification_token,
            "User registered, verification email queued"
        );

        let tokens = self.tokens.issue_pair(&user.user_id)?;

        Ok(RegisterOutput { user, tokens })
    }
}

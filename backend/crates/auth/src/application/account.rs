//! Account Use Cases
//!
//! Self-service operations on the authenticated user: profile update,
//! password change and account deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    person_name::PersonName,
    phone::Phone,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// The full set of fields a profile update may touch
///
/// This IS the allow-list: email, role, activation status, counters and
/// every other field have no representation here, so a request cannot
/// reach them no matter what it sends.
#[derive(Debug, Default)]
pub struct ProfileChanges {
    pub first_name: Option<PersonName>,
    pub last_name: Option<PersonName>,
    pub phone: Option<Phone>,
    pub birth_date: Option<DateTime<Utc>>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
    pub newsletter: Option<bool>,
    pub notifications: Option<bool>,
}

/// Profile update use case
pub struct UpdateProfileUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateProfileUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user: &User, changes: ProfileChanges) -> AuthResult<User> {
        let mut user = user.clone();

        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = changes.phone {
            user.phone = Some(phone);
        }
        if let Some(birth_date) = changes.birth_date {
            user.profile.birth_date = Some(birth_date);
        }
        if let Some(city) = changes.city {
            user.profile.address.city = Some(city);
        }
        if let Some(street) = changes.street {
            user.profile.address.street = Some(street);
        }
        if let Some(zip_code) = changes.zip_code {
            user.profile.address.zip_code = Some(zip_code);
        }
        if let Some(newsletter) = changes.newsletter {
            user.profile.preferences.newsletter = newsletter;
        }
        if let Some(notifications) = changes.notifications {
            user.profile.preferences.notifications = notifications;
        }
        user.updated_at = Utc::now();

        self.repo.update(&user).await?;

        tracing::debug!(user_id = %user.user_id, "Profile updated");

        Ok(user)
    }
}

/// Password change use case (authenticated)
pub struct ChangePasswordUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ChangePasswordUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        user: &User,
        current_password: String,
        new_password: RawPassword,
    ) -> AuthResult<()> {
        let current = RawPassword::for_verification(current_password);
        if !user.password_hash.verify(&current, self.config.pepper()) {
            return Err(AuthError::InvalidCurrentPassword);
        }

        if user.password_hash.verify(&new_password, self.config.pepper()) {
            return Err(AuthError::PasswordUnchanged);
        }

        let password_hash = UserPassword::from_raw(&new_password, self.config.pepper())
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let mut user = user.clone();
        user.set_password(password_hash);
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Password changed");

        Ok(())
    }
}

/// Account deletion use case (soft delete)
pub struct DeleteAccountUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> DeleteAccountUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    /// Deactivate the account and retire its email
    ///
    /// When a password is supplied it must match; a request without one
    /// is accepted (the session already proves possession of a token).
    pub async fn execute(&self, user: &User, password: Option<String>) -> AuthResult<()> {
        if let Some(password) = password {
            let candidate = RawPassword::for_verification(password);
            if !user.password_hash.verify(&candidate, self.config.pepper()) {
                return Err(AuthError::InvalidCurrentPassword);
            }
        }

        let mut user = user.clone();
        user.soft_delete();
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, "Account soft-deleted");

        Ok(())
    }
}

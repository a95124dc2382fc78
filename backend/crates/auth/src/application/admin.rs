//! Admin Use Cases
//!
//! Account administration: listing with pagination/search/filter,
//! aggregate statistics, role and activation changes. Authorization is
//! enforced at the route layer via the capability table.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::entity::user::User;
use crate::domain::repository::{UserListPage, UserListQuery, UserRepository, UserStats};
use crate::domain::value_object::{user_id::UserId, user_role::UserRole};
use crate::error::{AuthError, AuthResult};

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on page size
pub const MAX_PAGE_SIZE: u32 = 100;

/// Admin account operations
pub struct AdminUsersUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> AdminUsersUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Paginated listing; page and limit are clamped to sane bounds
    pub async fn list(&self, mut query: UserListQuery) -> AuthResult<UserListPage> {
        if query.page == 0 {
            query.page = 1;
        }
        if query.limit == 0 {
            query.limit = DEFAULT_PAGE_SIZE;
        }
        query.limit = query.limit.min(MAX_PAGE_SIZE);

        self.repo.list(&query).await
    }

    /// Aggregate account statistics
    pub async fn stats(&self) -> AuthResult<UserStats> {
        self.repo.stats(Utc::now()).await
    }

    /// Change a user's role
    pub async fn set_role(&self, user_id: &UserId, role: UserRole) -> AuthResult<User> {
        let mut user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.set_role(role);
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, role = %role, "User role updated");

        Ok(user)
    }

    /// Activate or deactivate a user
    pub async fn set_status(&self, user_id: &UserId, is_active: bool) -> AuthResult<User> {
        let mut user = self
            .repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        user.set_active(is_active);
        self.repo.update(&user).await?;

        tracing::info!(user_id = %user.user_id, is_active, "User status updated");

        Ok(user)
    }
}

//! Repository Traits
//!
//! The query interface of the credential store. This is the only way any
//! component touches user records; the engine behind it lives in the
//! infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::user::{LockoutUpdate, User};
use crate::domain::value_object::{email::Email, user_id::UserId, user_role::UserRole};
use crate::error::AuthResult;

/// Filtered, paginated listing request (admin)
#[derive(Debug, Clone, Default)]
pub struct UserListQuery {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Case-insensitive substring over first name, last name and email
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
}

/// One listing page plus the unpaginated total
#[derive(Debug, Clone)]
pub struct UserListPage {
    pub users: Vec<User>,
    pub total: u64,
}

/// Per-role aggregate row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleCount {
    pub role: UserRole,
    pub count: i64,
    pub active: i64,
}

/// Aggregate account statistics (admin)
#[derive(Debug, Clone)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub verified: i64,
    /// Accounts created within the last 30 days
    pub recent: i64,
    pub by_role: Vec<RoleCount>,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Persist a new user
    ///
    /// A duplicate email must surface as [`crate::AuthError::EmailTaken`],
    /// backed by a uniqueness constraint in the store (a pre-check query
    /// alone cannot close the concurrent-registration race).
    async fn create(&self, user: &User) -> AuthResult<()>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: &UserId) -> AuthResult<Option<User>>;

    /// Find user by normalized email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    /// Check if an email is registered
    async fn exists_by_email(&self, email: &Email) -> AuthResult<bool>;

    /// Find user by hashed reset token with an unexpired window
    async fn find_by_reset_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>>;

    /// Find user by plain verification token
    async fn find_by_verification_token(&self, token: &str) -> AuthResult<Option<User>>;

    /// Update user
    async fn update(&self, user: &User) -> AuthResult<()>;

    /// Record a failed login attempt
    ///
    /// Must be a single atomic conditional update at the store; two
    /// concurrent failures for one account may never lose an increment.
    /// Returns the post-update lockout state.
    async fn record_failed_login(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> AuthResult<LockoutUpdate>;

    /// Reset the failed-attempt counter and clear any lock
    async fn reset_login_attempts(&self, user_id: &UserId) -> AuthResult<()>;

    /// Filtered, paginated listing (admin)
    async fn list(&self, query: &UserListQuery) -> AuthResult<UserListPage>;

    /// Aggregate statistics (admin)
    async fn stats(&self, now: DateTime<Utc>) -> AuthResult<UserStats>;
}

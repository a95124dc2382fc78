//! User Entity
//!
//! The single account aggregate: identity, credentials, verification and
//! reset state, lockout counters and the nested profile document.
//! Sensitive fields never leave the crate unprojected; API responses go
//! through the public projection in the presentation layer.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    email::Email, person_name::PersonName, phone::Phone, user_id::UserId,
    user_password::UserPassword, user_role::UserRole,
};

/// Postal address inside the profile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub city: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
}

/// Notification preferences inside the profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub newsletter: bool,
    pub notifications: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            newsletter: true,
            notifications: true,
        }
    }
}

/// Nested profile document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub avatar: Option<String>,
    pub birth_date: Option<DateTime<Utc>>,
    pub address: Address,
    pub preferences: Preferences,
}

/// Result of a failed-login transition
///
/// The persisted counterpart is computed by the store in one atomic
/// statement; this struct carries the post-transition state back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutUpdate {
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,
}

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Normalized lowercase email, unique across live accounts
    pub email: Email,
    /// Argon2id PHC hash, never serialized to clients
    pub password_hash: UserPassword,
    pub first_name: PersonName,
    pub last_name: PersonName,
    pub phone: Option<Phone>,
    pub role: UserRole,
    pub is_email_verified: bool,
    /// Plain random token matched by direct lookup
    pub email_verification_token: Option<String>,
    /// SHA-256 hex of the reset token; the token itself is never stored
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires: Option<DateTime<Utc>>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    /// Consecutive failed login attempts
    pub login_attempts: i32,
    /// Account locked while this timestamp is in the future
    pub lock_until: Option<DateTime<Utc>>,
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Failed attempts before a temporary lock
    pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
    /// Lock duration after too many failures
    pub const LOCKOUT_HOURS: i64 = 2;

    /// Create a new user at registration time
    pub fn new(
        email: Email,
        password_hash: UserPassword,
        first_name: PersonName,
        last_name: PersonName,
        phone: Option<Phone>,
        email_verification_token: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            phone,
            role: UserRole::default(),
            is_email_verified: false,
            email_verification_token: Some(email_verification_token),
            password_reset_token_hash: None,
            password_reset_expires: None,
            last_login: None,
            is_active: true,
            login_attempts: 0,
            lock_until: None,
            profile: UserProfile::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check if the account is currently locked
    pub fn is_locked(&self) -> bool {
        self.is_locked_at(Utc::now())
    }

    /// Lock check against an explicit clock
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.lock_until, Some(until) if now < until)
    }

    /// Pure failed-login transition
    ///
    /// - expired lock: the discovering failure starts a fresh window,
    ///   counter = 1, lock cleared;
    /// - otherwise: counter + 1; reaching [`Self::MAX_LOGIN_ATTEMPTS`]
    ///   while not already locked sets `lock_until = now + 2h`;
    /// - an existing unexpired lock is never extended.
    pub fn next_failed_attempt(
        login_attempts: i32,
        lock_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> LockoutUpdate {
        if let Some(until) = lock_until {
            if until <= now {
                return LockoutUpdate {
                    login_attempts: 1,
                    lock_until: None,
                };
            }
            return LockoutUpdate {
                login_attempts: login_attempts + 1,
                lock_until: Some(until),
            };
        }

        let attempts = login_attempts + 1;
        let lock = if attempts >= Self::MAX_LOGIN_ATTEMPTS {
            Some(now + Duration::hours(Self::LOCKOUT_HOURS))
        } else {
            None
        };

        LockoutUpdate {
            login_attempts: attempts,
            lock_until: lock,
        }
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login = Some(now);
        self.updated_at = now;
    }

    /// Reset lockout state (successful authentication or password reset)
    pub fn reset_login_attempts(&mut self) {
        self.login_attempts = 0;
        self.lock_until = None;
        self.updated_at = Utc::now();
    }

    /// Replace the password hash
    pub fn set_password(&mut self, password_hash: UserPassword) {
        self.password_hash = password_hash;
        self.updated_at = Utc::now();
    }

    /// Begin a password reset window
    pub fn start_password_reset(&mut self, token_hash: String, expires: DateTime<Utc>) {
        self.password_reset_token_hash = Some(token_hash);
        self.password_reset_expires = Some(expires);
        self.updated_at = Utc::now();
    }

    /// Clear reset state (token consumed or superseded)
    pub fn clear_password_reset(&mut self) {
        self.password_reset_token_hash = None;
        self.password_reset_expires = None;
        self.updated_at = Utc::now();
    }

    /// Mark the email verified and consume the token
    pub fn mark_email_verified(&mut self) {
        self.is_email_verified = true;
        self.email_verification_token = None;
        self.updated_at = Utc::now();
    }

    /// Issue a fresh verification token
    pub fn set_verification_token(&mut self, token: String) {
        self.email_verification_token = Some(token);
        self.updated_at = Utc::now();
    }

    /// Update role (admin operation)
    pub fn set_role(&mut self, role: UserRole) {
        self.role = role;
        self.updated_at = Utc::now();
    }

    /// Update activation status (admin operation)
    pub fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
        self.updated_at = Utc::now();
    }

    /// Soft delete: deactivate and retire the email
    pub fn soft_delete(&mut self) {
        let now = Utc::now();
        self.is_active = false;
        self.email = self.email.retired(now.timestamp_millis());
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::user_password::RawPassword;

    fn test_user() -> User {
        let raw = RawPassword::new("Password123".to_string()).unwrap();
        User::new(
            Email::new("a@b.com").unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
            PersonName::new("Ann").unwrap(),
            PersonName::new("Lee").unwrap(),
            None,
            "token".to_string(),
        )
    }

    #[test]
    fn test_new_user_defaults() {
        let user = test_user();
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
        assert!(!user.is_email_verified);
        assert_eq!(user.login_attempts, 0);
        assert!(user.lock_until.is_none());
        assert!(user.email_verification_token.is_some());
        assert!(user.profile.preferences.newsletter);
        assert!(user.profile.preferences.notifications);
    }

    #[test]
    fn test_full_name() {
        assert_eq!(test_user().full_name(), "Ann Lee");
    }

    #[test]
    fn test_is_locked() {
        let mut user = test_user();
        assert!(!user.is_locked());

        user.lock_until = Some(Utc::now() + Duration::hours(1));
        assert!(user.is_locked());

        user.lock_until = Some(Utc::now() - Duration::hours(1));
        assert!(!user.is_locked());
    }

    #[test]
    fn test_failed_attempts_accumulate() {
        let now = Utc::now();
        let mut attempts = 0;
        let mut lock = None;

        for expected in 1..User::MAX_LOGIN_ATTEMPTS {
            let next = User::next_failed_attempt(attempts, lock, now);
            assert_eq!(next.login_attempts, expected);
            assert!(next.lock_until.is_none());
            attempts = next.login_attempts;
            lock = next.lock_until;
        }

        // Fifth failure locks for two hours
        let next = User::next_failed_attempt(attempts, lock, now);
        assert_eq!(next.login_attempts, User::MAX_LOGIN_ATTEMPTS);
        assert_eq!(
            next.lock_until,
            Some(now + Duration::hours(User::LOCKOUT_HOURS))
        );
    }

    #[test]
    fn test_expired_lock_restarts_at_one() {
        let now = Utc::now();
        let expired = Some(now - Duration::minutes(1));

        let next = User::next_failed_attempt(5, expired, now);
        assert_eq!(next.login_attempts, 1);
        assert!(next.lock_until.is_none());
    }

    #[test]
    fn test_active_lock_is_not_extended() {
        let now = Utc::now();
        let until = now + Duration::hours(1);

        let next = User::next_failed_attempt(5, Some(until), now);
        assert_eq!(next.login_attempts, 6);
        assert_eq!(next.lock_until, Some(until));
    }

    #[test]
    fn test_reset_login_attempts() {
        let mut user = test_user();
        user.login_attempts = 3;
        user.lock_until = Some(Utc::now() + Duration::hours(1));

        user.reset_login_attempts();
        assert_eq!(user.login_attempts, 0);
        assert!(user.lock_until.is_none());
    }

    #[test]
    fn test_mark_email_verified_consumes_token() {
        let mut user = test_user();
        user.mark_email_verified();
        assert!(user.is_email_verified);
        assert!(user.email_verification_token.is_none());
    }

    #[test]
    fn test_password_reset_lifecycle() {
        let mut user = test_user();
        let expires = Utc::now() + Duration::minutes(10);

        user.start_password_reset("hash".to_string(), expires);
        assert_eq!(user.password_reset_token_hash.as_deref(), Some("hash"));
        assert_eq!(user.password_reset_expires, Some(expires));

        user.clear_password_reset();
        assert!(user.password_reset_token_hash.is_none());
        assert!(user.password_reset_expires.is_none());
    }

    #[test]
    fn test_soft_delete() {
        let mut user = test_user();
        user.soft_delete();
        assert!(!user.is_active);
        assert!(user.email.as_str().starts_with("deleted_"));
        assert!(user.email.as_str().ends_with("_a@b.com"));
    }
}

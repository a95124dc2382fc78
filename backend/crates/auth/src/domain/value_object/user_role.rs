//! User Role Value Object
//!
//! Closed set of storefront roles with a capability table. Route guards
//! check capabilities, never role strings, so the guard set cannot drift
//! from the role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storefront user role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i16)]
pub enum UserRole {
    #[default]
    User = 0,
    Manager = 1,
    Admin = 2,
}

/// Capabilities gated by role
///
/// One row per protected operation family; the mapping lives in
/// [`UserRole::has`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Change roles and activation status of other accounts
    ManageUsers,
    /// Browse the paginated account list
    ViewUserList,
    /// View aggregate account statistics
    ViewUserStats,
}

impl UserRole {
    /// Every role, for iteration/validation
    pub const ALL: [UserRole; 3] = [UserRole::User, UserRole::Manager, UserRole::Admin];

    #[inline]
    pub const fn id(&self) -> i16 {
        *self as i16
    }

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Manager => "manager",
            UserRole::Admin => "admin",
        }
    }

    /// Capability table
    #[inline]
    pub const fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::ManageUsers => matches!(self, UserRole::Admin),
            Capability::ViewUserList => matches!(self, UserRole::Admin | UserRole::Manager),
            Capability::ViewUserStats => matches!(self, UserRole::Admin),
        }
    }

    #[inline]
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(UserRole::User),
            1 => Some(UserRole::Manager),
            2 => Some(UserRole::Admin),
            _ => None,
        }
    }

    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(UserRole::User),
            "manager" => Some(UserRole::Manager),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_role_from_id() {
        assert_eq!(UserRole::from_id(0), Some(UserRole::User));
        assert_eq!(UserRole::from_id(1), Some(UserRole::Manager));
        assert_eq!(UserRole::from_id(2), Some(UserRole::Admin));
        assert_eq!(UserRole::from_id(42), None);
    }

    #[test]
    fn test_user_role_from_code() {
        assert_eq!(UserRole::from_code("user"), Some(UserRole::User));
        assert_eq!(UserRole::from_code("manager"), Some(UserRole::Manager));
        assert_eq!(UserRole::from_code("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_code("superuser"), None);
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::User.to_string(), "user");
        assert_eq!(UserRole::Manager.to_string(), "manager");
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }

    #[test]
    fn test_default_role_is_user() {
        assert_eq!(UserRole::default(), UserRole::User);
    }

    #[test]
    fn test_capability_table() {
        assert!(UserRole::Admin.has(Capability::ManageUsers));
        assert!(!UserRole::Manager.has(Capability::ManageUsers));
        assert!(!UserRole::User.has(Capability::ManageUsers));

        assert!(UserRole::Admin.has(Capability::ViewUserList));
        assert!(UserRole::Manager.has(Capability::ViewUserList));
        assert!(!UserRole::User.has(Capability::ViewUserList));

        assert!(UserRole::Admin.has(Capability::ViewUserStats));
        assert!(!UserRole::Manager.has(Capability::ViewUserStats));
        assert!(!UserRole::User.has(Capability::ViewUserStats));
    }

    #[test]
    fn test_serde_codes_match() {
        for role in UserRole::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.code()));
        }
    }
}

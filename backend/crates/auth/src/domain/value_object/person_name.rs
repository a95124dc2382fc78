//! Person Name Value Object
//!
//! First/last names on the storefront account: 2 to 50 characters,
//! letters (any script), spaces and hyphens only. Input is trimmed.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum name length (in characters)
pub const NAME_MIN_LENGTH: usize = 2;

/// Maximum name length (in characters)
pub const NAME_MAX_LENGTH: usize = 50;

/// Validated first or last name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonName(String);

impl PersonName {
    /// Create a new name with validation
    pub fn new(name: impl Into<String>) -> AppResult<Self> {
        let name = name.into().trim().to_string();

        let char_count = name.chars().count();
        if char_count < NAME_MIN_LENGTH || char_count > NAME_MAX_LENGTH {
            return Err(AppError::bad_request(format!(
                "Name must be between {} and {} characters",
                NAME_MIN_LENGTH, NAME_MAX_LENGTH
            )));
        }

        if !name
            .chars()
            .all(|c| c.is_alphabetic() || c == ' ' || c == '-')
        {
            return Err(AppError::bad_request(
                "Name may only contain letters, spaces and hyphens",
            ));
        }

        Ok(Self(name))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(PersonName::new("Ann").is_ok());
        assert!(PersonName::new("Jean-Pierre").is_ok());
        assert!(PersonName::new("Mary Jane").is_ok());
        // Non-Latin scripts are letters too
        assert!(PersonName::new("Анна").is_ok());
        assert!(PersonName::new("山田").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(PersonName::new("A").is_err()); // too short
        assert!(PersonName::new("a".repeat(NAME_MAX_LENGTH + 1)).is_err());
        assert!(PersonName::new("Ann123").is_err());
        assert!(PersonName::new("Ann!").is_err());
        assert!(PersonName::new("  ").is_err());
    }

    #[test]
    fn test_name_trimmed() {
        let name = PersonName::new("  Ann  ").unwrap();
        assert_eq!(name.as_str(), "Ann");
    }
}

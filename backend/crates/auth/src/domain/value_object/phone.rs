//! Phone Number Value Object
//!
//! Optional contact number: an optional leading `+`, then 1 to 16 digits
//! with a non-zero first digit. Stored exactly as validated.

use kernel::error::app_error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone(String);

impl Phone {
    /// Create a new phone number with validation
    pub fn new(phone: impl Into<String>) -> AppResult<Self> {
        let phone = phone.into().trim().to_string();

        let digits = phone.strip_prefix('+').unwrap_or(&phone);

        let valid = !digits.is_empty()
            && digits.len() <= 16
            && digits.chars().all(|c| c.is_ascii_digit())
            && !digits.starts_with('0');

        if !valid {
            return Err(AppError::bad_request("Invalid phone number"));
        }

        Ok(Self(phone))
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(phone: impl Into<String>) -> Self {
        Self(phone.into())
    }

    /// Get the phone number as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_phones() {
        assert!(Phone::new("+79001234567").is_ok());
        assert!(Phone::new("79001234567").is_ok());
        assert!(Phone::new("123").is_ok());
    }

    #[test]
    fn test_invalid_phones() {
        assert!(Phone::new("").is_err());
        assert!(Phone::new("+").is_err());
        assert!(Phone::new("0123456").is_err()); // leading zero
        assert!(Phone::new("+7900abc").is_err());
        assert!(Phone::new("+12345678901234567").is_err()); // too long
    }
}

//! User Password Value Object
//!
//! Domain value object for user passwords. Delegates to
//! `platform::password` for cryptographic operations.
//!
//! Policy (length, character classes) applies when a password is set;
//! verification of an existing credential uses the policy-free
//! [`RawPassword::for_verification`] path so that legacy credentials and
//! obviously-wrong candidates still drive the normal failure handling.

use kernel::error::app_error::{AppError, AppResult};
use platform::password::{
    ClearTextPassword, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input
///
/// Wrapper around `ClearTextPassword` with domain-specific error handling.
/// Memory is automatically zeroized when dropped.
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password with policy validation
    ///
    /// ## Validation Rules
    /// - 6 to 128 characters (Unicode code points, NFKC normalized)
    /// - At least one lowercase letter, one uppercase letter and one digit
    /// - No control characters
    pub fn new(raw: String) -> AppResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| match e {
            PasswordPolicyError::TooShort { min, .. } => AppError::bad_request(format!(
                "Password must be at least {} characters long",
                min
            )),
            PasswordPolicyError::TooLong { max, .. } => {
                AppError::bad_request(format!("Password must be at most {} characters long", max))
            }
            PasswordPolicyError::EmptyOrWhitespace => AppError::bad_request("Password is required"),
            PasswordPolicyError::InvalidCharacter => {
                AppError::bad_request("Password contains invalid characters")
            }
            PasswordPolicyError::MissingComplexity => AppError::bad_request(
                "Password must contain at least one lowercase letter, one uppercase letter and one digit",
            ),
        })?;

        Ok(Self(clear_text))
    }

    /// Create without policy validation, for verifying against a stored hash
    pub fn for_verification(raw: String) -> Self {
        Self(ClearTextPassword::unchecked(raw))
    }

    /// Access the inner ClearTextPassword
    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Hashed user password for database storage
///
/// Stores the password in Argon2id PHC string format.
/// Safe to persist; never serialized into API responses.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Create from raw password by hashing
    ///
    /// ## Arguments
    /// * `raw` - The validated raw password
    /// * `pepper` - Optional application-wide secret
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> AppResult<Self> {
        let hashed = raw.inner().hash(pepper).map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) => {
                AppError::internal(format!("Password hashing failed: {}", msg))
            }
            _ => AppError::internal("Unexpected error during password hashing"),
        })?;

        Ok(Self(hashed))
    }

    /// Create from PHC string (from database)
    pub fn from_phc_string(phc_string: impl Into<String>) -> AppResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| AppError::internal("Invalid password hash in database"))?;

        Ok(Self(hashed))
    }

    /// Get PHC string for database storage
    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash
    ///
    /// ## Arguments
    /// * `raw` - The raw password to verify
    /// * `pepper` - Must match the pepper used during hashing
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

impl fmt::Display for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[HASHED_PASSWORD]")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_password_validation() {
        assert!(RawPassword::new("Password123".to_string()).is_ok());

        // Too short
        assert!(RawPassword::new("Ab1".to_string()).is_err());

        // Missing character classes
        assert!(RawPassword::new("alllowercase1".to_string()).is_err());
        assert!(RawPassword::new("NoDigitsHere".to_string()).is_err());

        // Empty
        assert!(RawPassword::new("".to_string()).is_err());
    }

    #[test]
    fn test_for_verification_skips_policy() {
        // Must not panic or error on policy-violating candidates
        let _ = RawPassword::for_verification("x".to_string());
        let _ = RawPassword::for_verification("".to_string());
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("TestPassword123".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();

        assert!(hashed.verify(&raw, None));

        let wrong = RawPassword::for_verification("WrongPassword123".to_string());
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_stored_hash_is_not_plaintext() {
        let raw = RawPassword::new("TestPassword123".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        assert!(!hashed.as_phc_string().contains("TestPassword123"));
    }

    #[test]
    fn test_phc_roundtrip() {
        let raw = RawPassword::new("TestPassword123".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, None));
    }

    #[test]
    fn test_debug_redaction() {
        let raw = RawPassword::for_verification("secret".to_string());
        let debug_output = format!("{:?}", raw);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}

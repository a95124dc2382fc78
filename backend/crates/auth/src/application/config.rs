//! Application Configuration
//!
//! Configuration for the auth application layer: token secrets and
//! lifetimes, cookie policy, password pepper.
//!
//! The placeholder secrets exist so that a development checkout works
//! without any environment; [`AuthConfig::from_env`] refuses them in
//! production instead of silently signing with a public value.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Token issuer claim (`iss`)
pub const TOKEN_ISSUER: &str = "vibepc-api";

/// Token audience claim (`aud`)
pub const TOKEN_AUDIENCE: &str = "vibepc-users";

/// Cookie carrying the access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Cookie carrying the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Known placeholder secrets; a production deployment hazard
const PLACEHOLDER_ACCESS_SECRET: &str = "your-super-secret-jwt-key-change-in-production";
const PLACEHOLDER_REFRESH_SECRET: &str = "your-super-secret-refresh-key-change-in-production";

/// Default access token lifetime (matches the access cookie Max-Age)
const DEFAULT_ACCESS_TTL_SECS: u64 = 15 * 60;

/// Default refresh token lifetime
const DEFAULT_REFRESH_TTL_SECS: u64 = 30 * 24 * 3600;

/// Configuration errors raised at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set to a non-placeholder value in production")]
    PlaceholderSecret(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret signing access tokens
    pub access_secret: String,
    /// Secret signing refresh tokens; must differ from the access secret
    pub refresh_secret: String,
    /// `iss` claim stamped into and required from every token
    pub issuer: String,
    /// `aud` claim stamped into and required from every token
    pub audience: String,
    /// Access token lifetime (also the access cookie Max-Age)
    pub access_token_ttl: Duration,
    /// Refresh token lifetime (also the refresh cookie Max-Age)
    pub refresh_token_ttl: Duration,
    /// Whether cookies carry the Secure flag
    pub cookie_secure: bool,
    /// SameSite policy for both token cookies
    pub cookie_same_site: SameSite,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: PLACEHOLDER_ACCESS_SECRET.to_string(),
            refresh_secret: PLACEHOLDER_REFRESH_SECRET.to_string(),
            issuer: TOKEN_ISSUER.to_string(),
            audience: TOKEN_AUDIENCE.to_string(),
            access_token_ttl: Duration::from_secs(DEFAULT_ACCESS_TTL_SECS),
            refresh_token_ttl: Duration::from_secs(DEFAULT_REFRESH_TTL_SECS),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            password_pepper: None,
        }
    }
}

impl AuthConfig {
    /// Create config with random secrets
    pub fn with_random_secrets() -> Self {
        Self {
            access_secret: random_secret(),
            refresh_secret: random_secret(),
            ..Default::default()
        }
    }

    /// Create config for development (insecure cookie, random secrets)
    pub fn development() -> Self {
        Self {
            cookie_secure: false,
            ..Self::with_random_secrets()
        }
    }

    /// Load configuration from the environment
    ///
    /// Recognized variables: `JWT_SECRET`, `JWT_REFRESH_SECRET`,
    /// `JWT_EXPIRES_IN_SECS`, `JWT_REFRESH_EXPIRES_IN_SECS`,
    /// `JWT_PASSWORD_PEPPER`, `APP_ENV`.
    ///
    /// Outside production, missing secrets fall back to the placeholders
    /// with a loud warning. With `APP_ENV=production` a missing or
    /// placeholder secret is a startup error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let production = env::var("APP_ENV").is_ok_and(|v| v == "production");

        let access_secret = secret_from_env("JWT_SECRET", PLACEHOLDER_ACCESS_SECRET, production)?;
        let refresh_secret =
            secret_from_env("JWT_REFRESH_SECRET", PLACEHOLDER_REFRESH_SECRET, production)?;

        let access_ttl = ttl_from_env("JWT_EXPIRES_IN_SECS", DEFAULT_ACCESS_TTL_SECS)?;
        let refresh_ttl = ttl_from_env("JWT_REFRESH_EXPIRES_IN_SECS", DEFAULT_REFRESH_TTL_SECS)?;

        let password_pepper = env::var("JWT_PASSWORD_PEPPER")
            .ok()
            .filter(|v| !v.is_empty())
            .map(|v| v.into_bytes());

        Ok(Self {
            access_secret,
            refresh_secret,
            access_token_ttl: Duration::from_secs(access_ttl),
            refresh_token_ttl: Duration::from_secs(refresh_ttl),
            cookie_secure: production,
            ..Default::default()
        }
        .with_pepper(password_pepper))
    }

    fn with_pepper(mut self, pepper: Option<Vec<u8>>) -> Self {
        self.password_pepper = pepper;
        self
    }

    /// Access token lifetime in whole seconds
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_token_ttl.as_secs() as i64
    }

    /// Refresh token lifetime in whole seconds
    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_token_ttl.as_secs() as i64
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}

fn random_secret() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn secret_from_env(
    var: &'static str,
    placeholder: &str,
    production: bool,
) -> Result<String, ConfigError> {
    match env::var(var).ok().filter(|v| !v.is_empty()) {
        Some(value) if value == placeholder => {
            if production {
                Err(ConfigError::PlaceholderSecret(var))
            } else {
                tracing::warn!(variable = var, "Using the placeholder signing secret");
                Ok(value)
            }
        }
        Some(value) => Ok(value),
        None => {
            if production {
                Err(ConfigError::PlaceholderSecret(var))
            } else {
                tracing::warn!(
                    variable = var,
                    "Signing secret not configured, falling back to the placeholder"
                );
                Ok(placeholder.to_string())
            }
        }
    }
}

fn ttl_from_env(var: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidValue(var, value)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lifetimes() {
        let config = AuthConfig::default();
        assert_eq!(config.access_ttl_secs(), 900);
        assert_eq!(config.refresh_ttl_secs(), 30 * 24 * 3600);
        assert!(config.cookie_secure);
    }

    #[test]
    fn test_development_config() {
        let config = AuthConfig::development();
        assert!(!config.cookie_secure);
        assert_ne!(config.access_secret, PLACEHOLDER_ACCESS_SECRET);
        assert_ne!(config.refresh_secret, PLACEHOLDER_REFRESH_SECRET);
        assert_ne!(config.access_secret, config.refresh_secret);
    }

    #[test]
    fn test_placeholder_secret_rejected_in_production() {
        let err = secret_from_env("JWT_SECRET_UNSET_FOR_TEST", PLACEHOLDER_ACCESS_SECRET, true);
        assert!(matches!(err, Err(ConfigError::PlaceholderSecret(_))));
    }

    #[test]
    fn test_placeholder_secret_allowed_in_development() {
        let secret =
            secret_from_env("JWT_SECRET_UNSET_FOR_TEST", PLACEHOLDER_ACCESS_SECRET, false)
                .unwrap();
        assert_eq!(secret, PLACEHOLDER_ACCESS_SECRET);
    }
}

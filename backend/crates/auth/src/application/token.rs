//! Token Service
//!
//! Issues and verifies signed, time-bound access and refresh tokens
//! (HS256). Access and refresh tokens are signed with distinct secrets
//! and are never interchangeable: refresh tokens additionally carry a
//! `type: "refresh"` claim that access verification rejects.
//!
//! Verification is a pure, synchronous computation; nothing here touches
//! the store.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::config::AuthConfig;
use crate::domain::value_object::user_id::UserId;
use crate::error::{AuthError, AuthResult};

/// Claim value marking refresh tokens
pub const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Claim set for both token kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id as a UUID string
    pub sub: String,
    pub iss: String,
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token kind marker; present only on refresh tokens
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Token verification failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signature is fine but the token is past its expiry
    #[error("token has expired")]
    Expired,

    /// Bad signature, wrong issuer/audience, or wrong token kind
    #[error("invalid token")]
    Invalid,

    /// Not a parseable JWT at all
    #[error("malformed token")]
    Malformed,
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid | TokenError::Malformed => AuthError::InvalidToken,
        }
    }
}

/// Access + refresh token pair issued on successful authentication
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct TokenService {
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            access_ttl: Duration::seconds(config.access_ttl_secs()),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs()),
            access_encoding: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
        }
    }

    /// Issue a short-lived access token
    pub fn issue_access_token(&self, user_id: &UserId) -> AuthResult<String> {
        let claims = self.claims(user_id, self.access_ttl, None);
        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to encode access token: {}", e)))
    }

    /// Issue a long-lived refresh token
    pub fn issue_refresh_token(&self, user_id: &UserId) -> AuthResult<String> {
        let claims = self.claims(
            user_id,
            self.refresh_ttl,
            Some(REFRESH_TOKEN_TYPE.to_string()),
        );
        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| AuthError::Internal(format!("Failed to encode refresh token: {}", e)))
    }

    /// Issue both tokens
    pub fn issue_pair(&self, user_id: &UserId) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Verify an access token
    ///
    /// A refresh token presented here fails even before the kind check,
    /// because the secrets differ; the kind check covers deployments
    /// misconfigured with identical secrets.
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token, &self.access_decoding)?;
        if claims.token_type.as_deref() == Some(REFRESH_TOKEN_TYPE) {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Verify a refresh token; requires the `type: "refresh"` claim
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token, &self.refresh_decoding)?;
        if claims.token_type.as_deref() != Some(REFRESH_TOKEN_TYPE) {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    fn claims(&self, user_id: &UserId, ttl: Duration, token_type: Option<String>) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            token_type,
        }
    }

    fn verify(&self, token: &str, key: &DecodingKey) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed,
            _ => TokenError::Invalid,
        })?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(&AuthConfig {
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            ..AuthConfig::default()
        })
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = test_service();
        let user_id = UserId::new();

        let token = service.issue_access_token(&user_id).unwrap();
        let claims = service.verify_access(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.iss, "vibepc-api");
        assert_eq!(claims.aud, "vibepc-users");
        assert!(claims.token_type.is_none());
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_roundtrip() {
        let service = test_service();
        let user_id = UserId::new();

        let token = service.issue_refresh_token(&user_id).unwrap();
        let claims = service.verify_refresh(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.token_type.as_deref(), Some("refresh"));
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 3600);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let service = test_service();
        let user_id = UserId::new();

        // Refresh token against the access verifier: wrong secret
        let refresh = service.issue_refresh_token(&user_id).unwrap();
        assert_eq!(service.verify_access(&refresh), Err(TokenError::Invalid));

        // Access token against the refresh verifier: wrong secret
        let access = service.issue_access_token(&user_id).unwrap();
        assert_eq!(service.verify_refresh(&access), Err(TokenError::Invalid));
    }

    #[test]
    fn test_refresh_type_required_even_with_shared_secret() {
        // A misconfigured deployment with one secret for both kinds
        let shared = TokenService::new(&AuthConfig {
            access_secret: "one-secret".to_string(),
            refresh_secret: "one-secret".to_string(),
            ..AuthConfig::default()
        });
        let user_id = UserId::new();

        let access = shared.issue_access_token(&user_id).unwrap();
        assert_eq!(shared.verify_refresh(&access), Err(TokenError::Invalid));

        let refresh = shared.issue_refresh_token(&user_id).unwrap();
        assert_eq!(shared.verify_access(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token() {
        let service = test_service();

        // Hand-craft a token that expired an hour ago, signed with the
        // correct secret, and run it through the real verification path.
        let now = Utc::now();
        let claims = Claims {
            sub: UserId::new().to_string(),
            iss: "vibepc-api".to_string(),
            aud: "vibepc-users".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            token_type: None,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("access-secret-for-tests".as_bytes()),
        )
        .unwrap();

        assert_eq!(service.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_malformed_token() {
        let service = test_service();
        assert_eq!(
            service.verify_access("not-a-jwt"),
            Err(TokenError::Malformed)
        );
        assert_eq!(service.verify_access(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let issuer_config = AuthConfig {
            access_secret: "access-secret-for-tests".to_string(),
            refresh_secret: "refresh-secret-for-tests".to_string(),
            issuer: "someone-else".to_string(),
            ..AuthConfig::default()
        };
        let other = TokenService::new(&issuer_config);
        let token = other.issue_access_token(&UserId::new()).unwrap();

        let service = test_service();
        assert_eq!(service.verify_access(&token), Err(TokenError::Invalid));
    }
}

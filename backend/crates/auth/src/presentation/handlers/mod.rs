//! HTTP Handlers
//!
//! Shared state and cookie helpers; the handlers themselves are split
//! between the auth flows and the user/account flows.

pub mod auth;
pub mod user;

use std::sync::Arc;

use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;

use platform::cookie::CookieConfig;

use crate::application::config::{ACCESS_TOKEN_COOKIE, AuthConfig, REFRESH_TOKEN_COOKIE};
use crate::application::token::{TokenPair, TokenService};
use crate::domain::repository::UserRepository;

/// Shared state for handlers and middleware
pub struct AppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenService>,
}

impl<R> AppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, config: AuthConfig) -> Self {
        let tokens = TokenService::new(&config);
        Self {
            repo: Arc::new(repo),
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

// Manual Clone: `R` itself need not be Clone for Arc<R> to be
impl<R> Clone for AppState<R>
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            config: self.config.clone(),
            tokens: self.tokens.clone(),
        }
    }
}

fn cookie_config(config: &AuthConfig, name: &str, max_age_secs: i64) -> CookieConfig {
    CookieConfig {
        name: name.to_string(),
        secure: config.cookie_secure,
        http_only: true,
        same_site: config.cookie_same_site,
        path: "/".to_string(),
        max_age_secs: Some(max_age_secs),
    }
}

/// Set-Cookie headers delivering a fresh token pair
pub(crate) fn set_token_cookies(
    config: &AuthConfig,
    tokens: &TokenPair,
) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    let access = cookie_config(config, ACCESS_TOKEN_COOKIE, config.access_ttl_secs())
        .build_set_cookie(&tokens.access_token);
    let refresh = cookie_config(config, REFRESH_TOKEN_COOKIE, config.refresh_ttl_secs())
        .build_set_cookie(&tokens.refresh_token);

    AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)])
}

/// Set-Cookie headers clearing both token cookies
pub(crate) fn clear_token_cookies(
    config: &AuthConfig,
) -> AppendHeaders<[(axum::http::HeaderName, String); 2]> {
    let access = cookie_config(config, ACCESS_TOKEN_COOKIE, 0).build_delete_cookie();
    let refresh = cookie_config(config, REFRESH_TOKEN_COOKIE, 0).build_delete_cookie();

    AppendHeaders([(SET_COOKIE, access), (SET_COOKIE, refresh)])
}

//! Auth (Authentication & Accounts) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Business logic, entities, repository traits
//! - `application/` - Use cases, token service, configuration
//! - `infra/` - Database implementations
//! - `presentation/` - HTTP handlers, DTOs, validation, routers
//!
//! ## Features
//! - User registration/login with email + password
//! - Stateless JWT access/refresh tokens (header or cookie delivery)
//! - Automatic lockout after failed login attempts
//! - Password reset and email verification flows (delivery stubbed to logs)
//! - Role-based access (User, Manager, Admin) with a capability table
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Access and refresh tokens signed with distinct secrets
//! - Uniform responses on login/forgot-password/check-email paths
//!   (no account enumeration)

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::token::TokenService;
pub use error::{AuthError, AuthResult};
pub use infra::postgres::PgUserRepository;
pub use presentation::router::{auth_router, user_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult, FieldError},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod handlers {
    pub use crate::presentation::handlers::*;
}

pub mod store {
    pub use crate::infra::postgres::PgUserRepository as UserStore;
}

pub mod router {
    pub use crate::presentation::router::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}

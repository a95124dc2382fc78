//! Presentation Layer
//!
//! HTTP handlers, DTOs, validation, middleware, and routers.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod validation;

pub use handlers::AppState;
pub use middleware::{CurrentUser, authorize, optional_auth, require_auth};
pub use router::{auth_router, auth_router_generic, user_router, user_router_generic};

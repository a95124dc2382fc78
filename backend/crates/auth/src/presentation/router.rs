//! Routers
//!
//! `auth_router` carries the authentication flows, `user_router` the
//! account/admin flows. Protected routes are wrapped by `require_auth`;
//! admin routes additionally pass the capability gate. The `_generic`
//! variants exist so tests can mount the same routes over any repository
//! implementation.

use axum::{
    Router,
    extract::Request,
    middleware::{self, Next},
    routing::{delete, get, post, put},
};

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::user_role::Capability;
use crate::infra::postgres::PgUserRepository;
use crate::presentation::handlers::{self, AppState};
use crate::presentation::middleware::{authorize, require_auth};

/// Create the auth router with the PostgreSQL repository
pub fn auth_router(repo: PgUserRepository, config: AuthConfig) -> Router {
    auth_router_generic(AppState::new(repo, config))
}

/// Create the user router with the PostgreSQL repository
pub fn user_router(repo: PgUserRepository, config: AuthConfig) -> Router {
    user_router_generic(AppState::new(repo, config))
}

/// Auth routes over any repository implementation
pub fn auth_router_generic<R>(state: AppState<R>) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let protected = Router::new()
        .route("/logout", post(handlers::auth::logout::<R>))
        .route("/me", get(handlers::auth::me))
        .route(
            "/resend-verification",
            post(handlers::auth::resend_verification::<R>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R>,
        ));

    Router::new()
        .route("/register", post(handlers::auth::register::<R>))
        .route("/login", post(handlers::auth::login::<R>))
        .route("/refresh-token", post(handlers::auth::refresh_token::<R>))
        .route("/forgot-password", post(handlers::auth::forgot_password::<R>))
        .route("/reset-password", post(handlers::auth::reset_password::<R>))
        .route("/verify-email", post(handlers::auth::verify_email::<R>))
        .route("/check-email", post(handlers::auth::check_email::<R>))
        .merge(protected)
        .with_state(state)
}

/// User/account routes over any repository implementation
pub fn user_router_generic<R>(state: AppState<R>) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
{
    let self_service = Router::new()
        .route(
            "/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile::<R>),
        )
        .route("/change-password", put(handlers::user::change_password::<R>))
        .route("/account", delete(handlers::user::delete_account::<R>));

    let staff = Router::new()
        .route("/list", get(handlers::user::list::<R>))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            authorize(Capability::ViewUserList, req, next)
        }));

    let admin_stats = Router::new()
        .route("/stats", get(handlers::user::stats::<R>))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            authorize(Capability::ViewUserStats, req, next)
        }));

    let admin_manage = Router::new()
        .route("/{user_id}/role", put(handlers::user::set_role::<R>))
        .route("/{user_id}/status", put(handlers::user::set_status::<R>))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            authorize(Capability::ManageUsers, req, next)
        }));

    // `require_auth` is added last so it runs first and attaches the
    // identity the capability gates read.
    Router::new()
        .merge(self_service)
        .merge(staff)
        .merge(admin_stats)
        .merge(admin_manage)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<R>,
        ))
        .with_state(state)
}

//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; application-level errors go through
//! `kernel::error::AppError` and the auth crate's error taxonomy.

use std::env;
use std::sync::OnceLock;
use std::time::Instant;

use auth::{AuthConfig, PgUserRepository};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{self, Method, header},
    routing::get,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kernel::error::app_error::AppError;

/// Request body cap; larger payloads get 413 before any handler runs
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

static STARTED_AT: OnceLock<Instant> = OnceLock::new();

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,auth=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    STARTED_AT.set(Instant::now()).ok();

    // Auth configuration; refuses placeholder secrets in production
    let auth_config = AuthConfig::from_env()?;

    // Database connection
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let repo = PgUserRepository::new(pool.clone());

    // CORS configuration
    let frontend_origins =
        env::var("FRONTEND_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ]))
        .allow_credentials(true);

    let app = Router::new()
        .nest(
            "/api/auth",
            auth::auth_router(repo.clone(), auth_config.clone()),
        )
        .nest("/api/user", auth::user_router(repo, auth_config))
        .route("/api/health", get(health))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000);

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    let uptime_secs = STARTED_AT
        .get()
        .map(|started| started.elapsed().as_secs())
        .unwrap_or(0);

    Json(serde_json::json!({
        "status": "success",
        "message": "VibePC Backend API is running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": uptime_secs,
    }))
}

/// Fallback for unknown routes
async fn not_found() -> AppError {
    AppError::not_found("Route not found")
}

/// Resolve on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

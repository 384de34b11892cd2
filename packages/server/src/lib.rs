//! HTTP server for the school administration backend.
//!
//! Wires the database, the intake core, and the axum router together:
//! public registration/contact endpoints, a JWT-guarded admin surface,
//! and a Server-Sent Events stream of committed registrations.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use actors::{IntakeConfig, SurrealGateway, start_intake};
use db::DbConfig;
use db::repositories::UserRepository;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use routes::{admin, events, public};
use state::AppState;

pub async fn start_server() -> Result<(), Box<dyn std::error::Error>> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    info!("Initializing database...");
    db::init(DbConfig::endpoint(config.db_endpoint.clone())).await?;
    UserRepository::ensure_default_admin(
        &config.default_admin_email,
        &config.default_admin_password,
    )
    .await?;

    info!("Starting intake core...");
    let intake = start_intake(
        Arc::new(SurrealGateway),
        IntakeConfig {
            tick_interval: Duration::from_millis(config.queue_tick_ms),
            metrics_capacity: config.metrics_capacity,
        },
    )
    .await?;
    warn!("Fallback queue is in-memory; pending jobs do not survive a restart");

    let state = AppState {
        config: Arc::new(config),
        intake,
    };

    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.intake.shutdown();
    info!("Server shut down");
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let admin_routes = Router::new()
        .route("/registrations", get(admin::list_registrations))
        .route(
            "/registrations/{id}",
            put(admin::update_registration).delete(admin::delete_registration),
        )
        .route("/messages", get(admin::list_messages))
        .route("/messages/{id}", put(admin::update_message))
        .route("/reports", get(admin::reports))
        .route("/stats", get(admin::stats))
        .route("/queue", get(admin::queue_state))
        .route("/metrics", get(admin::recent_metrics))
        .route(
            "/settings",
            get(admin::get_settings).put(admin::put_settings),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .route("/api/register", post(public::register))
        .route("/api/contact", post(public::contact))
        .route("/api/admin/login", post(admin::login))
        .nest("/api/admin", admin_routes)
        .route("/events", get(events::events))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

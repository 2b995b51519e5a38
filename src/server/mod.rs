//! HTTP server
//!
//! Axum router over the step controller. Layer order is cors (outer) ->
//! auth -> handler so CORS preflight requests are answered before the
//! credential check.

pub mod auth;
pub mod routes;
pub mod state;

pub use auth::{generate_auth_token, AuthLayer, AuthProvider, AuthUser, StaticCredentials};
pub use state::ServerAppState;

use axum::http::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{delete, get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Build the full application router with auth and CORS layers applied
pub fn build_router(
    state: ServerAppState,
    provider: Arc<dyn AuthProvider>,
    cors_origins: Option<Vec<String>>,
) -> Router {
    // Explicit headers instead of Any: browsers reject wildcard header
    // lists when the Authorization header is present
    let cors = match &cors_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<HeaderValue> =
                origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods(Any)
                .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
        }
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]),
    };

    Router::new()
        .route("/topics", post(routes::create_topic).get(routes::list_topics))
        .route("/topics/:id", delete(routes::delete_topic))
        .route("/topics/:id/sessions", get(routes::topic_sessions))
        .route("/sessions", post(routes::create_session))
        .route("/sessions/:session_id/step", post(routes::step_session))
        .route("/sessions/:session_id/report", post(routes::generate_report))
        .route(
            "/sessions/:session_id/messages",
            get(routes::session_messages),
        )
        .route(
            "/sessions/:session_id/reports",
            get(routes::session_reports),
        )
        .route("/health", get(health_handler))
        .layer(AuthLayer::new(provider))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until interrupted
pub async fn run_server(
    port: u16,
    bind: &str,
    state: ServerAppState,
    provider: Arc<dyn AuthProvider>,
    cors_origins: Option<Vec<String>>,
) -> Result<(), String> {
    let cors_display = match &cors_origins {
        Some(origins) if !origins.is_empty() => origins.join(", "),
        _ => "*".to_string(),
    };

    let app = build_router(state, provider, cors_origins);

    let addr: SocketAddr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);
    log::info!("CORS origins: {}", cors_display);

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {}", e);
        }
        log::info!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

//! HTTP front end.
//!
//! The browser owns the real WebGL globe; this server owns everything
//! else. One `NavController` behind a mutex serves all requests, so the
//! session is shared across clients on purpose.

mod handlers;
mod state;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::config::Settings;
use crate::gazetteer::Gazetteer;

/// Everything the server needs at startup.
pub struct ServeOptions {
    pub settings: Settings,
    pub gazetteer: Gazetteer,
    pub offline: bool,
    /// Pin the device position instead of using IP geolocation.
    pub fixed_position: Option<(f64, f64)>,
}

pub fn build_router(options: ServeOptions) -> Router {
    let state = state::build(options);

    Router::new()
        .route("/", get(handlers::index))
        .route("/api/health", get(handlers::health))
        .route("/api/countries", get(handlers::countries))
        .route("/api/countries/{code}", get(handlers::country_detail))
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/query", post(handlers::query))
        .route("/api/photo", post(handlers::photo))
        .route("/api/chat", post(handlers::chat))
        .route("/api/recommendations", post(handlers::recommendations))
        .route("/api/summary", post(handlers::summary))
        .route("/api/nearby", get(handlers::nearby))
        .route("/api/weather", get(handlers::weather))
        .route("/api/session", get(handlers::session))
        .route("/api/tabs/{id}/activate", post(handlers::activate_tab))
        .route("/api/tabs/{id}", delete(handlers::close_tab))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, options: ServeOptions) {
    let app = build_router(options);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  AtlasIQ server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        });
}

use axum::http::{HeaderValue, Method};
use axum::Router;
use innerspell_ai::{AIService, ModelGateway};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod api;
pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

use api::AppState;
use config::Config;

/// Router with CORS restricted to the configured origin
pub fn build_app(state: AppState, cors_origin: &str) -> Result<Router, Box<dyn std::error::Error>> {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Ok(api::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors))
}

/// Build the recommender against the Anthropic gateway
pub fn build_state(config: &Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let gateway: Arc<dyn ModelGateway> = Arc::new(AIService::new());
    if let Err(e) = gateway.ensure_configured() {
        warn!("Model gateway not configured, chat will ask users to contact an administrator: {}", e);
    }
    Ok(AppState::new(config, gateway)?)
}

pub async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;
    let app = build_app(state, &config.cors_origin)?;

    // Create socket address
    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));

    info!("Server listening on {}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use axum::{extract::State, response::Result, Json};
use innerspell_core::ConsultantCatalog;
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};

use super::AppState;

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub async fn health_check() -> Result<Json<Value>> {
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "innerspell"
    })))
}

/// Health plus readiness of the recommender
pub async fn status_check(State(state): State<AppState>) -> Result<Json<Value>> {
    let model_configured = state.gateway.ensure_configured().is_ok();
    let policy = state.recommender.policy();

    Ok(Json(json!({
        "status": if model_configured { "healthy" } else { "degraded" },
        "timestamp": timestamp(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "innerspell",
        "model_configured": model_configured,
        "consultants": state.catalog.consultants().len(),
        "slots": policy.slots.iter().map(|s| s.kind.as_str()).collect::<Vec<_>>(),
        "output_mode": state.recommender.output_mode(),
    })))
}

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use innerspell_ai::ModelGateway;
use innerspell_core::{CatalogError, StaticCatalog};
use innerspell_prompts::PromptManager;
use innerspell_recommender::{DailySpellGenerator, Recommender};
use tracing::info;

use crate::config::Config;
use crate::error::{ApiResult, AppError};

pub mod chat;
pub mod consultants;
pub mod daily_spell;
pub mod health;
pub mod pagination;
pub mod response;

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub catalog: Arc<StaticCatalog>,
    pub daily_spell: Arc<DailySpellGenerator>,
    pub gateway: Arc<dyn ModelGateway>,
}

impl AppState {
    pub fn new(config: &Config, gateway: Arc<dyn ModelGateway>) -> ApiResult<Self> {
        let catalog = match &config.catalog_path {
            Some(path) => StaticCatalog::from_path(path),
            None => StaticCatalog::builtin(),
        }
        .map_err(|e| match e {
            CatalogError::Io(err) => AppError::internal(
                anyhow::Error::new(err).context("Failed to read consultant catalog"),
            ),
            other => AppError::config(format!("Invalid consultant catalog: {}", other)),
        })?;
        let catalog = Arc::new(catalog);

        let mut prompts = PromptManager::new(config.prompts_dir.clone())
            .map_err(|e| AppError::config(e.to_string()))?;

        let recommender = Recommender::new(
            gateway.clone(),
            catalog.clone(),
            config.policy.clone(),
            &mut prompts,
        )
        .map_err(|e| AppError::config(e.to_string()))?
        .with_output_mode(config.output_mode);

        let daily_spell = DailySpellGenerator::new(gateway.clone(), &mut prompts)
            .map_err(|e| AppError::config(e.to_string()))?;

        info!(
            "Application state ready: {} consultants, {:?} output",
            catalog.len(),
            config.output_mode
        );

        Ok(Self {
            recommender: Arc::new(recommender),
            catalog,
            daily_spell: Arc::new(daily_spell),
            gateway,
        })
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/status", get(health::status_check))
        .route("/api/chat", post(chat::chat))
        .route("/api/consultants", get(consultants::list_consultants))
        .route("/api/consultants/{id}", get(consultants::get_consultant))
        .route("/api/specialties", get(consultants::list_specialties))
        .route("/api/daily-spell", get(daily_spell::daily_spell))
        .with_state(state)
}

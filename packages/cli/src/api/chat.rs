// ABOUTME: Chat endpoint for the consultant recommender
// ABOUTME: Accepts the full conversation history and returns the reply for the latest turn

use axum::{extract::State, Json};
use innerspell_recommender::{ChatMessage, RecommendationResult};
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::error::{ApiResult, AppError};

/// Longest history accepted in one request
pub const MAX_HISTORY_TURNS: usize = 100;
/// Longest single message accepted, in characters
pub const MAX_MESSAGE_CHARS: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Advance the conversation by one turn.
///
/// Model and schema failures come back as a normal reply with an apology,
/// so this only errors on malformed requests.
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<RecommendationResult>> {
    validate_history(&request.messages)?;

    info!("Chat turn with {} messages", request.messages.len());
    let result = state
        .recommender
        .advance_conversation(&request.messages)
        .await;

    Ok(Json(result))
}

fn validate_history(messages: &[ChatMessage]) -> ApiResult<()> {
    if messages.len() > MAX_HISTORY_TURNS {
        return Err(AppError::validation(format!(
            "conversation exceeds {} messages",
            MAX_HISTORY_TURNS
        )));
    }
    if let Some(index) = messages
        .iter()
        .position(|m| m.content.chars().count() > MAX_MESSAGE_CHARS)
    {
        return Err(AppError::validation(format!(
            "message {} exceeds {} characters",
            index, MAX_MESSAGE_CHARS
        )));
    }
    Ok(())
}

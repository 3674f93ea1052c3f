use axum::{extract::State, Json};
use chrono::Local;
use innerspell_recommender::DailySpell;

use super::response::ApiResponse;
use super::AppState;

/// Today's spell card; a fixed card is returned when the model is unavailable
pub async fn daily_spell(State(state): State<AppState>) -> Json<ApiResponse<DailySpell>> {
    let today = Local::now().date_naive();
    Json(ApiResponse::success(state.daily_spell.draw(today).await))
}

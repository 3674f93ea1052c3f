use axum::{
    extract::{Path, Query, State},
    Json,
};
use innerspell_core::{ConsultantCatalog, ConsultantFilter, ConsultantProfile, ConsultantStatus};
use serde::Deserialize;

use super::pagination::{PaginatedResponse, PaginationParams};
use super::response::ApiResponse;
use super::AppState;
use crate::error::{ApiResult, AppError};

#[derive(Debug, Deserialize)]
pub struct ConsultantQuery {
    pub specialty: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

impl ConsultantQuery {
    fn filter(&self) -> ApiResult<ConsultantFilter> {
        let mut filter = ConsultantFilter::default();
        if let Some(specialty) = &self.specialty {
            filter = filter.with_specialty(specialty.as_str());
        }
        if let Some(status) = &self.status {
            let status = status
                .parse::<ConsultantStatus>()
                .map_err(AppError::validation)?;
            filter = filter.with_status(status);
        }
        Ok(filter)
    }
}

/// Browse consultants by specialty and availability, one page at a time
pub async fn list_consultants(
    State(state): State<AppState>,
    Query(query): Query<ConsultantQuery>,
) -> ApiResult<Json<ApiResponse<PaginatedResponse<ConsultantProfile>>>> {
    let filter = query.filter()?;
    let matching: Vec<ConsultantProfile> =
        state.catalog.filter(&filter).into_iter().cloned().collect();
    let params = PaginationParams::new(query.page, query.limit);

    Ok(Json(ApiResponse::success(PaginatedResponse::paginate(
        &matching, &params,
    ))))
}

/// Specialty labels for the browser's filter buttons
pub async fn list_specialties(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    let specialties = state
        .catalog
        .specialties()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(ApiResponse::success(specialties))
}

/// Full profile for one consultant, used to hydrate recommendations
pub async fn get_consultant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ConsultantProfile>>> {
    state
        .catalog
        .find_by_id(&id)
        .cloned()
        .map(|profile| Json(ApiResponse::success(profile)))
        .ok_or_else(AppError::not_found)
}

use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, state::AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "OK", body = HealthResponse),
        (status = 500, description = "Database unreachable", body = crate::response::ErrorResponse),
    ),
        tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    state.orm.ping().await?;

    Ok(Json(HealthResponse {
        success: true,
        message: "Health check".to_string(),
        status: "ok".to_string(),
    }))
}

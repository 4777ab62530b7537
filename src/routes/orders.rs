use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};

use crate::{
    dto::orders::{CheckoutRequest, PlacedOrderResponse},
    error::{AppError, AppResult},
    response::ErrorResponse,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_order))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CheckoutRequest,
    responses(
        (
            status = 201,
            description = "Order rows committed and stock decremented",
            body = PlacedOrderResponse
        ),
        (status = 400, description = "Malformed JSON body", body = ErrorResponse),
        (status = 404, description = "Product not found", body = ErrorResponse),
        (status = 409, description = "Insufficient stock", body = ErrorResponse),
        (status = 422, description = "Missing or invalid field", body = ErrorResponse),
        (status = 500, description = "Retries exhausted or database failure", body = ErrorResponse),
        (status = 503, description = "Attempt timed out", body = ErrorResponse),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<PlacedOrderResponse>)> {
    let Json(payload) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let placed = order_service::place_order(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(placed.into())))
}

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::ErrorResponse;

/// Failures of the order placement engine.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(String),

    #[error("Product with id {0} not found")]
    ProductNotFound(i64),

    #[error(
        "Insufficient stock for product id {product_id}. \
         Available: {available}, Requested: {requested}"
    )]
    InsufficientStock {
        product_id: i64,
        available: i32,
        requested: i32,
    },

    /// The order number collided with an existing row. Retried internally.
    #[error("Order number {0} is already taken")]
    OrderNumberConflict(String),

    #[error("Order number generation failed after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Checkout attempt exceeded {0:?}")]
    AttemptTimedOut(Duration),

    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),
}

impl CheckoutError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, CheckoutError::OrderNumberConflict(_))
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("{source}")]
    Checkout {
        source: CheckoutError,
        /// Retries performed before giving up; `None` when the failure
        /// happened before the first attempt.
        retry_count: Option<u32>,
        max_retries: Option<u32>,
    },

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),
}

impl AppError {
    pub fn checkout(source: CheckoutError, retry_count: u32, max_retries: u32) -> Self {
        AppError::Checkout {
            source,
            retry_count: Some(retry_count),
            max_retries: Some(max_retries),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(source: CheckoutError) -> Self {
        AppError::Checkout {
            source,
            retry_count: None,
            max_retries: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Checkout { source, .. } => match source {
                CheckoutError::Validation(message) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
                }
                CheckoutError::ProductNotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "Failed to create order. Please try again.".to_string(),
                ),
                CheckoutError::InsufficientStock { .. } => (
                    StatusCode::CONFLICT,
                    "Failed to create order. Please try again.".to_string(),
                ),
                CheckoutError::RetriesExhausted { .. }
                | CheckoutError::OrderNumberConflict(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create order after multiple attempts. Please try again."
                        .to_string(),
                ),
                CheckoutError::AttemptTimedOut(_) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Failed to create order. Please try again.".to_string(),
                ),
                CheckoutError::Database(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create order. Please try again.".to_string(),
                ),
            },
            AppError::OrmError(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let (retry_count, max_retries) = match &self {
            AppError::Checkout {
                retry_count,
                max_retries,
                ..
            } => (*retry_count, *max_retries),
            _ => (None, None),
        };

        let body = ErrorResponse {
            success: false,
            message,
            error: self.to_string(),
            retry_count,
            max_retries,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bigdecimal::BigDecimal;
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Card not found with id: {0}")]
    CardNotFound(i64),

    #[error("User not found with id: {0}")]
    UserNotFound(i64),

    #[error("Card with id: {card_id} is blocked. Reason: {reason}")]
    CardBlocked { card_id: i64, reason: String },

    #[error("Insufficient balance. Required: {required}, Available: {available}, Shortage: {}", shortage(.required, .available))]
    InsufficientBalance {
        required: BigDecimal,
        available: BigDecimal,
    },

    #[error("{0}")]
    InvalidTransfer(String),

    #[error("{0}")]
    InvalidAmount(String),

    #[error("Card with this number already exists")]
    DuplicateCardNumber,

    #[error("Card with id: {0} has transaction history and cannot be deleted")]
    CardHasHistory(i64),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cipher error: {0}")]
    Cipher(String),
}

fn shortage(required: &BigDecimal, available: &BigDecimal) -> BigDecimal {
    required - available
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::CardNotFound(_) | AppError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AppError::CardBlocked { .. }
            | AppError::InsufficientBalance { .. }
            | AppError::InvalidTransfer(_)
            | AppError::InvalidAmount(_)
            | AppError::DuplicateCardNumber
            | AppError::CardHasHistory(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Configuration(_) | AppError::Cipher(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

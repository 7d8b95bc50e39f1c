//! HTTP error envelope: `{ "success": false, "message": ..., "kind": ... }`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::inventory::InventoryError;
use crate::orders::{OrderError, OrderStatusError};
use crate::reviews::ReviewError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("Insufficient permissions")]
    InsufficientPermission,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidStatus(String),
    #[error("{0}")]
    InvalidTransition(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    InsufficientStock(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Internal server error")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: String,
    kind: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::InsufficientPermission => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidStatus(_)
            | ApiError::InvalidTransition(_)
            | ApiError::Validation(_)
            | ApiError::InsufficientStock(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::InsufficientPermission => "insufficient_permission",
            ApiError::NotFound(_) => "not_found",
            ApiError::InvalidStatus(_) => "invalid_status",
            ApiError::InvalidTransition(_) => "invalid_transition",
            ApiError::Validation(_) => "validation",
            ApiError::InsufficientStock(_) => "insufficient_stock",
            ApiError::Conflict(_) => "conflict",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        ApiError::Internal(format!("{context}: {err}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }
        let body = ErrorBody {
            success: false,
            message: self.to_string(),
            kind: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::internal("database", err)
    }
}

impl From<OrderStatusError> for ApiError {
    fn from(err: OrderStatusError) -> Self {
        match err {
            OrderStatusError::InvalidStatus(_) | OrderStatusError::UnknownStatus(_) => {
                ApiError::InvalidStatus(err.to_string())
            }
            OrderStatusError::InvalidTransition { .. } | OrderStatusError::NotShipped { .. } => {
                ApiError::InvalidTransition(err.to_string())
            }
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),
            InventoryError::BelowReserved { .. } | InventoryError::QuantityTooLarge { .. } => {
                ApiError::Validation(err.to_string())
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::NotFound(_) | OrderError::ProductNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrderError::Validation(msg) => ApiError::Validation(msg),
            OrderError::Status(e) => e.into(),
            OrderError::Inventory(e) => e.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::InvalidRating | ReviewError::InvalidStatus => {
                ApiError::Validation(err.to_string())
            }
            ReviewError::ProductNotFound
            | ReviewError::CustomerNotFound
            | ReviewError::NotFound
            | ReviewError::NotOwned => ApiError::NotFound(err.to_string()),
            ReviewError::AlreadyReviewed => ApiError::Conflict(err.to_string()),
        }
    }
}

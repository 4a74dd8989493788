/*!
 * Error types
 * Store, dialog, dashboard and HTTP-facing errors
 */
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::content::ContentType;
use crate::routes::ErrorResponse;
use crate::store::Table;

/// Errors raised by a `DataStore` implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: Table, column: String },

    #[error("Invalid row for table '{table}': {reason}")]
    InvalidRow { table: Table, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while normalizing a content draft
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogError {
    #[error("{0} is required")]
    MissingField(String),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Dialog is not open")]
    Closed,

    #[error("Dialog is already being submitted")]
    Submitting,

    #[error("{0}")]
    Rejected(String),
}

/// Errors raised by dashboard operations
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Dialog(#[from] DialogError),

    #[error("Cannot delete item: unknown type")]
    UnknownType,

    #[error("{kind} {id} not found")]
    NotFound { kind: ContentType, id: String },

    #[error("Image host not allowed: {0}")]
    ImageHost(String),

    #[error("Nothing pending deletion")]
    NoPendingDelete,

    #[error("Record has no valid id")]
    MissingId,

    #[error("Malformed {kind} row: {reason}")]
    Decode { kind: ContentType, reason: String },
}

/// Error returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Dashboard(#[from] DashboardError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad request", Some(msg.clone())),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", Some(msg.clone())),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not found", Some(msg.clone())),
            ApiError::Dashboard(err) => match err {
                DashboardError::Dialog(DialogError::Submitting) => {
                    (StatusCode::CONFLICT, "Conflict", Some(err.to_string()))
                }
                DashboardError::Dialog(e) => {
                    (StatusCode::BAD_REQUEST, "Invalid content", Some(e.to_string()))
                }
                DashboardError::UnknownType => {
                    (StatusCode::BAD_REQUEST, "Unknown type", Some(err.to_string()))
                }
                DashboardError::ImageHost(_) | DashboardError::MissingId => {
                    (StatusCode::BAD_REQUEST, "Invalid content", Some(err.to_string()))
                }
                DashboardError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "Not found", Some(err.to_string()))
                }
                DashboardError::NoPendingDelete => {
                    (StatusCode::CONFLICT, "Conflict", Some(err.to_string()))
                }
                DashboardError::Store(StoreError::UnknownColumn { .. }) => {
                    (StatusCode::BAD_REQUEST, "Bad request", Some(err.to_string()))
                }
                DashboardError::Store(_) | DashboardError::Decode { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "Database error", None)
                }
            },
            ApiError::Store(StoreError::Unavailable(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Database not available", None)
            }
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error", None),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

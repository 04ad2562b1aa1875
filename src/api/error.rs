use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::reports::ReportError;
use crate::terminal::TerminalError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Helper to log error and return generic internal server error
pub fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, Json<ErrorResponse>) {
    error!("Internal error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal server error".to_string(),
        }),
    )
}

pub fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map tracker failures to response codes. Everything except storage
/// failure reflects real-world state and keeps its message; storage
/// failures are logged and masked.
pub fn terminal_error(err: TerminalError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        TerminalError::DuplicateArrival(_) | TerminalError::AlreadyDeparted(_) => {
            StatusCode::CONFLICT
        }
        TerminalError::VisitNotFound(_) => StatusCode::NOT_FOUND,
        TerminalError::InvalidReference(_) | TerminalError::EmptyBusNumber => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TerminalError::Storage(_) => return internal_error(err),
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub fn report_error(err: ReportError) -> (StatusCode, Json<ErrorResponse>) {
    match &err {
        ReportError::InvalidWindow { .. } => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        ),
        ReportError::Storage(_) => internal_error(err),
    }
}

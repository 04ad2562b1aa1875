use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::net::SocketAddr;
use utoipa::ToSchema;

use crate::api::error::terminal_error;
use crate::api::{AppState, ErrorResponse};
use crate::audit::{self, AuditEntry, ACTION_DEPARTURE_RECORDED};
use crate::terminal::DepartureReceipt;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordDepartureRequest {
    /// The open visit being closed.
    pub visit_id: i64,
    /// Operator identity from the session layer, stored for the audit
    /// trail. Not authenticated here.
    pub recorded_by: i64,
}

/// Record a bus departing from the terminal
#[utoipa::path(
    post,
    path = "/departures",
    request_body = RecordDepartureRequest,
    responses(
        (status = 201, description = "Departure recorded, dwell time computed", body = DepartureReceipt),
        (status = 404, description = "No such visit", body = ErrorResponse),
        (status = 409, description = "Visit already departed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "terminal"
)]
pub async fn record_departure(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RecordDepartureRequest>,
) -> Result<(StatusCode, Json<DepartureReceipt>), (StatusCode, Json<ErrorResponse>)> {
    let receipt = state
        .tracker
        .record_departure(request.visit_id, request.recorded_by)
        .await
        .map_err(terminal_error)?;

    audit::record(
        &state.pool,
        AuditEntry {
            user_id: request.recorded_by,
            action: ACTION_DEPARTURE_RECORDED,
            record_id: receipt.departure_id,
            description: format!("Bus {} departure recorded", receipt.bus_number),
            remote_addr: Some(addr.ip().to_string()),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(receipt)))
}

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
use crate::audit::{self, AuditEntry, ACTION_ARRIVAL_RECORDED};
use crate::models::EntryMethod;
use crate::terminal::{ArrivalReceipt, NewArrival};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordArrivalRequest {
    /// Plate/registration of the arriving bus. Normalized to uppercase.
    pub bus_number: String,
    pub route_id: i64,
    pub entry_method: EntryMethod,
    #[serde(default)]
    pub operator_name: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    /// Operator identity from the session layer, stored for the audit
    /// trail. Not authenticated here.
    pub recorded_by: i64,
}

/// Record a bus arriving at the terminal
#[utoipa::path(
    post,
    path = "/arrivals",
    request_body = RecordArrivalRequest,
    responses(
        (status = 201, description = "Arrival recorded, visit opened", body = ArrivalReceipt),
        (status = 409, description = "Bus is already in the terminal", body = ErrorResponse),
        (status = 422, description = "Unknown route or empty bus number", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "terminal"
)]
pub async fn record_arrival(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RecordArrivalRequest>,
) -> Result<(StatusCode, Json<ArrivalReceipt>), (StatusCode, Json<ErrorResponse>)> {
    let recorded_by = request.recorded_by;

    let receipt = state
        .tracker
        .record_arrival(NewArrival {
            bus_number: request.bus_number,
            route_id: request.route_id,
            entry_method: request.entry_method,
            operator_name: request.operator_name,
            remarks: request.remarks,
            recorded_by,
        })
        .await
        .map_err(terminal_error)?;

    audit::record(
        &state.pool,
        AuditEntry {
            user_id: recorded_by,
            action: ACTION_ARRIVAL_RECORDED,
            record_id: receipt.visit_id,
            description: format!("Bus {} arrival recorded", receipt.bus_number),
            remote_addr: Some(addr.ip().to_string()),
        },
    )
    .await;

    Ok((StatusCode::CREATED, Json(receipt)))
}

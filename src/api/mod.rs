pub mod audit;
pub mod buses;
pub mod error;
pub mod reports;
pub mod routes;
pub mod terminal;

pub use error::{internal_error, ErrorResponse};

use sqlx::SqlitePool;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::terminal::OccupancyTracker;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tracker: OccupancyTracker,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bus Terminal API",
        description = "Arrival/departure recording and time-bucketed operational reports for a bus terminal"
    ),
    tags(
        (name = "terminal", description = "Arrival and departure recording, current occupancy"),
        (name = "reports", description = "Hourly/daily/weekly/monthly/yearly activity reports"),
        (name = "reference", description = "Route and registered fleet reference data"),
        (name = "audit", description = "Operator activity trail")
    )
)]
pub struct ApiDoc;

pub fn router(state: AppState) -> OpenApiRouter {
    let pool: SqlitePool = state.pool.clone();

    OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api/terminal", terminal::router(state))
        .nest("/api/reports", reports::router(pool.clone()))
        .nest("/api/routes", routes::router(pool.clone()))
        .nest("/api/buses", buses::router(pool.clone()))
        .nest("/api/audit", audit::router(pool))
}

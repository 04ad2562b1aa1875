pub mod arrivals;
pub mod departures;
pub mod occupancy;

use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::AppState;

pub fn router(state: AppState) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(arrivals::record_arrival))
        .routes(routes!(departures::record_departure))
        .routes(routes!(occupancy::get_occupancy))
        .routes(routes!(occupancy::get_occupancy_count))
        .with_state(state)
}

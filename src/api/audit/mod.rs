pub mod list;

use sqlx::SqlitePool;
use utoipa_axum::{router::OpenApiRouter, routes};

pub fn router(pool: SqlitePool) -> OpenApiRouter {
    OpenApiRouter::new()
        .routes(routes!(list::list_audit_log))
        .with_state(pool)
}

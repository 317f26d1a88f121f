use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::db::{interact, DbPool};
use crate::version::GIT_VERSION;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    git_version: &'static str,
}

/// Liveness plus a trivial query so a broken database reports 503.
pub async fn health_check(State(pool): State<DbPool>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = interact(&pool, |conn| {
        Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?)
    })
    .await
    .is_ok();

    if !database_ok {
        tracing::warn!("Health check failed to reach the database");
    }

    let (code, status) = if database_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        code,
        Json(HealthResponse {
            status,
            git_version: GIT_VERSION,
        }),
    )
}

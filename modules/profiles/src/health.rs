use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;

use crate::outbox::repo;
use crate::outbox::{OutboxRecord, OutboxStats};

/// Health check endpoint handler
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "profiles-rs",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Pending / processed / dead-lettered counts of the outbox
pub async fn outbox_stats(
    State(pool): State<PgPool>,
) -> Result<Json<OutboxStats>, (StatusCode, String)> {
    repo::outbox_stats(&pool).await.map(Json).map_err(internal)
}

#[derive(Debug, Deserialize)]
pub struct DeadLetterQuery {
    pub limit: Option<i64>,
}

pub async fn dead_letters(
    State(pool): State<PgPool>,
    Query(query): Query<DeadLetterQuery>,
) -> Result<Json<Vec<OutboxRecord>>, (StatusCode, String)> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    repo::list_dead_lettered(&pool, limit)
        .await
        .map(Json)
        .map_err(internal)
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    tracing::error!(error = %e, "Outbox query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
}

/// Operational routes, bound to the write-side pool
pub fn router(pool: PgPool) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/outbox/stats", get(outbox_stats))
        .route("/api/outbox/dead-letters", get(dead_letters))
        .with_state(pool)
}

pub mod doctors;

use axum::Router;
use sqlx::PgPool;

use crate::health;

/// Full HTTP surface: ops routes on the write pool, doctor queries on the read pool
pub fn router(write: PgPool, read: PgPool) -> Router {
    health::router(write).merge(doctors::router(read))
}

//! Doctor read API
//!
//! Backed by the read pool only. A doctor created a moment ago may not be
//! visible here until the dispatcher has projected it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::events::DoctorStatus;
use crate::repos::doctor_query_repo::{self, DoctorListItem, DoctorProfileView};

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    /// Integer status code, e.g. `2` for on vacation
    pub status: Option<i32>,
}

/// Strict decoding: unlike stored rows, a filter never falls back to `Unknown`
fn status_filter(code: i32) -> Option<DoctorStatus> {
    let status = DoctorStatus::from_code(code);
    (status.code() == code).then_some(status)
}

/// GET /api/doctors[?status=N]
pub async fn list_doctors(
    State(pool): State<PgPool>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Vec<DoctorListItem>>, (StatusCode, String)> {
    let doctors = match query.status {
        Some(code) => {
            let status = status_filter(code).ok_or_else(|| {
                (StatusCode::BAD_REQUEST, format!("unknown status code {code}"))
            })?;
            doctor_query_repo::list_by_status(&pool, status).await
        }
        None => doctor_query_repo::list_doctors(&pool).await,
    };

    doctors.map(Json).map_err(internal)
}

/// GET /api/doctors/{id}
pub async fn get_doctor(
    State(pool): State<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<DoctorProfileView>, (StatusCode, String)> {
    match doctor_query_repo::find_profile(&pool, id).await.map_err(internal)? {
        Some(profile) => Ok(Json(profile)),
        None => Err((StatusCode::NOT_FOUND, format!("doctor {id} not found"))),
    }
}

fn internal(e: sqlx::Error) -> (StatusCode, String) {
    tracing::error!(error = %e, "Doctor query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_string())
}

pub fn router(read: PgPool) -> Router {
    Router::new()
        .route("/api/doctors", get(list_doctors))
        .route("/api/doctors/{id}", get(get_doctor))
        .with_state(read)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_accepts_known_codes_only() {
        assert_eq!(status_filter(2), Some(DoctorStatus::OnVacation));
        assert_eq!(status_filter(0), Some(DoctorStatus::Unknown));
        assert_eq!(status_filter(8), None);
        assert_eq!(status_filter(-1), None);
    }
}

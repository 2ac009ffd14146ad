//! Read-side doctor queries
//!
//! Serves profile and listing lookups straight from `read.doctors`, so the
//! results lag the write store by however far the outbox is behind.

use chrono::{Datelike, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::doctor_read_repo::{DoctorRow, READ_COLUMNS};
use crate::events::DoctorStatus;
use crate::projections::DoctorReadModel;

/// Whole years of practice; a start year in the future counts as zero
pub fn experience_years(career_start_year: i32, current_year: i32) -> i32 {
    (current_year - career_start_year).max(0)
}

fn current_year() -> i32 {
    Utc::now().year()
}

/// Full doctor profile with derived experience
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorProfileView {
    #[serde(flatten)]
    pub doctor: DoctorReadModel,
    pub experience: i32,
}

impl DoctorProfileView {
    pub fn new(doctor: DoctorReadModel, current_year: i32) -> Self {
        let experience = experience_years(doctor.career_start_year, current_year);
        Self { doctor, experience }
    }
}

/// One row of a doctor listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorListItem {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub photo_url: Option<String>,
    pub experience: i32,
    pub status: DoctorStatus,
    pub specialization_name: String,
    pub services: Vec<String>,
}

impl DoctorListItem {
    pub fn new(doctor: DoctorReadModel, current_year: i32) -> Self {
        Self {
            id: doctor.id,
            experience: experience_years(doctor.career_start_year, current_year),
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            middle_name: doctor.middle_name,
            photo_url: doctor.photo_url,
            status: doctor.status,
            specialization_name: doctor.specialization_name,
            services: doctor.services,
        }
    }
}

pub async fn find_profile(pool: &PgPool, id: Uuid) -> Result<Option<DoctorProfileView>, sqlx::Error> {
    let row = sqlx::query_as::<_, DoctorRow>(&format!(
        "SELECT {READ_COLUMNS} FROM read.doctors WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let year = current_year();
    Ok(row.map(|row| DoctorProfileView::new(row.into(), year)))
}

/// Every projected doctor ordered by last name, then first name
pub async fn list_doctors(pool: &PgPool) -> Result<Vec<DoctorListItem>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DoctorRow>(&format!(
        "SELECT {READ_COLUMNS} FROM read.doctors ORDER BY last_name, first_name, id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(into_items(rows))
}

/// Doctors currently in `status`, same ordering as [`list_doctors`]
pub async fn list_by_status(
    pool: &PgPool,
    status: DoctorStatus,
) -> Result<Vec<DoctorListItem>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DoctorRow>(&format!(
        "SELECT {READ_COLUMNS} FROM read.doctors WHERE status = $1 \
         ORDER BY last_name, first_name, id"
    ))
    .bind(status.code())
    .fetch_all(pool)
    .await?;

    Ok(into_items(rows))
}

fn into_items(rows: Vec<DoctorRow>) -> Vec<DoctorListItem> {
    let year = current_year();
    rows.into_iter()
        .map(|row| DoctorListItem::new(row.into(), year))
        .collect()
}

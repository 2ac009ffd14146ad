//! Write-side doctor and reference data persistence
//!
//! Mutations take the caller's transaction so the outbox record produced by
//! the same change commits or rolls back with them.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub use crate::events::Doctor;
use crate::events::DoctorStatus;

#[derive(Debug, FromRow)]
struct DoctorRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    middle_name: Option<String>,
    date_of_birth: NaiveDate,
    email: String,
    photo_url: Option<String>,
    career_start_year: i32,
    status: i32,
    specialization_id: Uuid,
}

impl From<DoctorRow> for Doctor {
    fn from(row: DoctorRow) -> Self {
        Doctor {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            middle_name: row.middle_name,
            date_of_birth: row.date_of_birth,
            email: row.email,
            photo_url: row.photo_url,
            career_start_year: row.career_start_year,
            status: DoctorStatus::from_code(row.status),
            specialization_id: row.specialization_id,
        }
    }
}

const DOCTOR_COLUMNS: &str = "id, first_name, last_name, middle_name, date_of_birth, email, \
     photo_url, career_start_year, status, specialization_id";

pub async fn insert_doctor(
    tx: &mut Transaction<'_, Postgres>,
    doctor: &Doctor,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO write.doctors (
            id, first_name, last_name, middle_name, date_of_birth, email,
            photo_url, career_start_year, status, specialization_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(doctor.id)
    .bind(&doctor.first_name)
    .bind(&doctor.last_name)
    .bind(&doctor.middle_name)
    .bind(doctor.date_of_birth)
    .bind(&doctor.email)
    .bind(&doctor.photo_url)
    .bind(doctor.career_start_year)
    .bind(doctor.status.code())
    .bind(doctor.specialization_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Overwrite the profile fields of a live doctor
///
/// Returns false when the doctor is missing or soft-deleted.
pub async fn update_doctor(
    tx: &mut Transaction<'_, Postgres>,
    doctor: &Doctor,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE write.doctors
        SET first_name = $2,
            last_name = $3,
            middle_name = $4,
            date_of_birth = $5,
            email = $6,
            photo_url = $7,
            career_start_year = $8,
            status = $9,
            specialization_id = $10
        WHERE id = $1 AND NOT is_deleted
        "#,
    )
    .bind(doctor.id)
    .bind(&doctor.first_name)
    .bind(&doctor.last_name)
    .bind(&doctor.middle_name)
    .bind(doctor.date_of_birth)
    .bind(&doctor.email)
    .bind(&doctor.photo_url)
    .bind(doctor.career_start_year)
    .bind(doctor.status.code())
    .bind(doctor.specialization_id)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set a new status and return the previous one
///
/// The row is locked for the rest of the transaction.
pub async fn update_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    status: DoctorStatus,
) -> Result<Option<DoctorStatus>, sqlx::Error> {
    let old: Option<i32> = sqlx::query_scalar(
        "SELECT status FROM write.doctors WHERE id = $1 AND NOT is_deleted FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(old) = old else {
        return Ok(None);
    };

    sqlx::query("UPDATE write.doctors SET status = $2 WHERE id = $1")
        .bind(id)
        .bind(status.code())
        .execute(&mut **tx)
        .await?;

    Ok(Some(DoctorStatus::from_code(old)))
}

pub async fn soft_delete(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    deleted_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE write.doctors
        SET is_deleted = TRUE, deleted_at = $2
        WHERE id = $1 AND NOT is_deleted
        "#,
    )
    .bind(id)
    .bind(deleted_at)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<Doctor>, sqlx::Error> {
    let row = sqlx::query_as::<_, DoctorRow>(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM write.doctors WHERE id = $1 AND NOT is_deleted"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Doctor::from))
}

/// Every doctor that is not soft-deleted, ordered by id
pub async fn list_active(pool: &PgPool) -> Result<Vec<Doctor>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DoctorRow>(&format!(
        "SELECT {DOCTOR_COLUMNS} FROM write.doctors WHERE NOT is_deleted ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Doctor::from).collect())
}

pub async fn insert_specialization(
    pool: &PgPool,
    id: Uuid,
    name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO write.specializations (id, name) VALUES ($1, $2)")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn rename_specialization(pool: &PgPool, id: Uuid, name: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE write.specializations SET name = $2 WHERE id = $1")
        .bind(id)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Create a service and attach it to a specialization
pub async fn insert_service(
    pool: &PgPool,
    specialization_id: Uuid,
    id: Uuid,
    name: &str,
    is_active: bool,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO write.services (id, name, is_active) VALUES ($1, $2, $3)")
        .bind(id)
        .bind(name)
        .bind(is_active)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO write.specialization_services (specialization_id, service_id) VALUES ($1, $2)",
    )
    .bind(specialization_id)
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

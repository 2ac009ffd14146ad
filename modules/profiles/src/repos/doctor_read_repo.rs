use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::events::DoctorStatus;
use crate::projections::{DoctorProjectionStore, DoctorReadModel, ProjectionError};

pub(crate) const READ_COLUMNS: &str = "id, first_name, last_name, middle_name, date_of_birth, \
     email, photo_url, career_start_year, status, specialization_id, specialization_name, services";

/// Raw `read.doctors` row; status is stored as its integer code
#[derive(Debug, FromRow)]
pub(crate) struct DoctorRow {
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
    specialization_name: String,
    services: Vec<String>,
}

impl From<DoctorRow> for DoctorReadModel {
    fn from(row: DoctorRow) -> Self {
        DoctorReadModel {
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
            specialization_name: row.specialization_name,
            services: row.services,
        }
    }
}

/// Postgres-backed doctor projection store
#[derive(Clone)]
pub struct PgDoctorProjectionStore {
    pool: PgPool,
}

impl PgDoctorProjectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Delete projected doctors whose id is not in `keep`
    pub async fn delete_except(&self, keep: &[Uuid]) -> Result<u64, ProjectionError> {
        let result = sqlx::query("DELETE FROM read.doctors WHERE NOT (id = ANY($1))")
            .bind(keep)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Ids of every projected doctor
    pub async fn list_ids(&self) -> Result<Vec<Uuid>, ProjectionError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM read.doctors ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    pub async fn count(&self) -> Result<i64, ProjectionError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM read.doctors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl DoctorProjectionStore for PgDoctorProjectionStore {
    async fn exists(&self, id: Uuid) -> Result<bool, ProjectionError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM read.doctors WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn get(&self, id: Uuid) -> Result<Option<DoctorReadModel>, ProjectionError> {
        let row = sqlx::query_as::<_, DoctorRow>(&format!(
            "SELECT {READ_COLUMNS} FROM read.doctors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(DoctorReadModel::from))
    }

    async fn insert(&self, doctor: &DoctorReadModel) -> Result<bool, ProjectionError> {
        let result = sqlx::query(
            r#"
            INSERT INTO read.doctors (
                id, first_name, last_name, middle_name, date_of_birth, email,
                photo_url, career_start_year, status, specialization_id,
                specialization_name, services
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
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
        .bind(&doctor.specialization_name)
        .bind(&doctor.services)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn upsert(&self, doctor: &DoctorReadModel) -> Result<(), ProjectionError> {
        sqlx::query(
            r#"
            INSERT INTO read.doctors (
                id, first_name, last_name, middle_name, date_of_birth, email,
                photo_url, career_start_year, status, specialization_id,
                specialization_name, services
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE
            SET first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                middle_name = EXCLUDED.middle_name,
                date_of_birth = EXCLUDED.date_of_birth,
                email = EXCLUDED.email,
                photo_url = EXCLUDED.photo_url,
                career_start_year = EXCLUDED.career_start_year,
                status = EXCLUDED.status,
                specialization_id = EXCLUDED.specialization_id,
                specialization_name = EXCLUDED.specialization_name,
                services = EXCLUDED.services
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
        .bind(&doctor.specialization_name)
        .bind(&doctor.services)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: DoctorStatus) -> Result<bool, ProjectionError> {
        let result = sqlx::query("UPDATE read.doctors SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.code())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ProjectionError> {
        let result = sqlx::query("DELETE FROM read.doctors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

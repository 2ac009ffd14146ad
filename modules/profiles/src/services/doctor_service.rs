//! Write-side doctor commands
//!
//! Each command changes `write.doctors` and appends the matching event to the
//! outbox inside one [`OutboxTransaction`]. Either both land or neither does.

use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::events::{
    Doctor, DoctorCreatedEvent, DoctorDeletedEvent, DoctorStatus, DoctorStatusChangedEvent,
    DoctorUpdatedEvent,
};
use crate::outbox::{OutboxWriteError, OutboxWriter};
use crate::repos::doctor_write_repo;

#[derive(Debug, thiserror::Error)]
pub enum DoctorServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("doctor {0} not found")]
    NotFound(Uuid),

    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<OutboxWriteError> for DoctorServiceError {
    fn from(err: OutboxWriteError) -> Self {
        match err {
            OutboxWriteError::Serialization(e) => DoctorServiceError::Serialization(e),
            OutboxWriteError::Database(e) => DoctorServiceError::Database(e),
        }
    }
}

/// Editable profile fields of a doctor
#[derive(Debug, Clone, PartialEq)]
pub struct DoctorProfile {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub photo_url: Option<String>,
    pub career_start_year: i32,
    pub specialization_id: Uuid,
    pub status: DoctorStatus,
}

impl DoctorProfile {
    fn into_doctor(self, id: Uuid) -> Doctor {
        Doctor {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            middle_name: self.middle_name,
            date_of_birth: self.date_of_birth,
            email: self.email,
            photo_url: self.photo_url,
            career_start_year: self.career_start_year,
            status: self.status,
            specialization_id: self.specialization_id,
        }
    }
}

#[derive(Clone)]
pub struct DoctorService {
    pool: PgPool,
    writer: OutboxWriter,
}

impl DoctorService {
    pub fn new(pool: PgPool, writer: OutboxWriter) -> Self {
        Self { pool, writer }
    }

    pub async fn create_doctor(&self, profile: DoctorProfile) -> Result<Doctor, DoctorServiceError> {
        let doctor = profile.into_doctor(Uuid::new_v4());

        let mut tx = self.writer.begin(&self.pool).await?;
        doctor_write_repo::insert_doctor(tx.transaction(), &doctor).await?;
        tx.add_message(&DoctorCreatedEvent::new(&doctor)).await?;
        tx.commit().await?;

        tracing::info!(doctor_id = %doctor.id, "Doctor created");
        Ok(doctor)
    }

    pub async fn edit_doctor(
        &self,
        id: Uuid,
        profile: DoctorProfile,
    ) -> Result<Doctor, DoctorServiceError> {
        let doctor = profile.into_doctor(id);

        let mut tx = self.writer.begin(&self.pool).await?;
        if !doctor_write_repo::update_doctor(tx.transaction(), &doctor).await? {
            return Err(DoctorServiceError::NotFound(id));
        }
        tx.add_message(&DoctorUpdatedEvent::new(&doctor)).await?;
        tx.commit().await?;

        tracing::info!(doctor_id = %id, "Doctor profile updated");
        Ok(doctor)
    }

    /// Returns the previous status
    pub async fn change_doctor_status(
        &self,
        id: Uuid,
        new_status: DoctorStatus,
    ) -> Result<DoctorStatus, DoctorServiceError> {
        let mut tx = self.writer.begin(&self.pool).await?;
        let old_status = doctor_write_repo::update_status(tx.transaction(), id, new_status)
            .await?
            .ok_or(DoctorServiceError::NotFound(id))?;

        tx.add_message(&DoctorStatusChangedEvent {
            event_id: Uuid::new_v4(),
            occurred_on: Utc::now(),
            doctor_id: id,
            old_status,
            new_status,
        })
        .await?;
        tx.commit().await?;

        tracing::info!(doctor_id = %id, ?old_status, ?new_status, "Doctor status changed");
        Ok(old_status)
    }

    /// Mark the doctor deleted on the write side; the projection row is removed
    pub async fn soft_delete_doctor(&self, id: Uuid) -> Result<(), DoctorServiceError> {
        let now = Utc::now();

        let mut tx = self.writer.begin(&self.pool).await?;
        if !doctor_write_repo::soft_delete(tx.transaction(), id, now).await? {
            return Err(DoctorServiceError::NotFound(id));
        }
        tx.add_message(&DoctorDeletedEvent {
            event_id: Uuid::new_v4(),
            occurred_on: now,
            doctor_id: id,
        })
        .await?;
        tx.commit().await?;

        tracing::info!(doctor_id = %id, "Doctor soft-deleted");
        Ok(())
    }
}

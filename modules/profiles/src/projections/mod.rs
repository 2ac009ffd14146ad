//! Read-side projections
//!
//! The read store holds flattened copies of write-side aggregates so queries
//! never join across normalized tables. Rows here are derived from the outbox
//! event stream only and may lag the write side.

pub mod doctor;

pub use doctor::DoctorProjectionHandler;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::events::{Doctor, DoctorStatus};

/// Denormalized doctor row in `read.doctors`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorReadModel {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub photo_url: Option<String>,
    pub career_start_year: i32,
    pub status: DoctorStatus,
    pub specialization_id: Uuid,
    /// Copied from `write.specializations` at projection time
    pub specialization_name: String,
    /// Active service names of the specialization, sorted
    pub services: Vec<String>,
}

impl DoctorReadModel {
    /// Flatten a doctor profile together with its specialization
    pub fn project(doctor: Doctor, specialization: SpecializationSnapshot) -> Self {
        Self {
            id: doctor.id,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            middle_name: doctor.middle_name,
            date_of_birth: doctor.date_of_birth,
            email: doctor.email,
            photo_url: doctor.photo_url,
            career_start_year: doctor.career_start_year,
            status: doctor.status,
            specialization_id: specialization.id,
            specialization_name: specialization.name,
            services: specialization.services,
        }
    }
}

/// Reference data copied into a doctor projection
#[derive(Debug, Clone, PartialEq)]
pub struct SpecializationSnapshot {
    pub id: Uuid,
    pub name: String,
    pub services: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProjectionError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("specialization {0} not found in write store")]
    SpecializationNotFound(Uuid),
}

/// Writes to the read-side doctor table
///
/// Each method is a single statement, so concurrent dispatchers applying
/// events for the same doctor never interleave inside one operation.
#[async_trait]
pub trait DoctorProjectionStore: Send + Sync {
    async fn exists(&self, id: Uuid) -> Result<bool, ProjectionError>;

    async fn get(&self, id: Uuid) -> Result<Option<DoctorReadModel>, ProjectionError>;

    /// Insert unless a row with the same id exists
    async fn insert(&self, doctor: &DoctorReadModel) -> Result<bool, ProjectionError>;

    /// Insert, or overwrite every column of an existing row, in one statement
    async fn upsert(&self, doctor: &DoctorReadModel) -> Result<(), ProjectionError>;

    async fn update_status(&self, id: Uuid, status: DoctorStatus) -> Result<bool, ProjectionError>;

    async fn delete(&self, id: Uuid) -> Result<bool, ProjectionError>;
}

/// Lookups against write-side reference data
#[async_trait]
pub trait ReferenceDataSource: Send + Sync {
    async fn specialization(
        &self,
        id: Uuid,
    ) -> Result<Option<SpecializationSnapshot>, ProjectionError>;
}

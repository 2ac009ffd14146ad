//! Full rebuild of `read.doctors` from the write store
//!
//! Treats `write.doctors` as the source of truth: every live doctor is
//! upserted with fresh reference data and every other read row is removed.
//! A live doctor whose specialization cannot be found is skipped: its read
//! row, if any, is left as it was. Running it twice yields the same table.

use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::projections::{
    DoctorProjectionStore, DoctorReadModel, ProjectionError, ReferenceDataSource,
};
use crate::repos::doctor_write_repo;
use crate::repos::PgDoctorProjectionStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub upserted: usize,
    pub removed: usize,
    /// Doctors whose specialization no longer exists; their rows are kept
    pub skipped: Vec<Uuid>,
}

/// Recompute every doctor projection
///
/// With `dry_run` nothing is written; the report shows what would change.
pub async fn rebuild_doctor_projection(
    write: &PgPool,
    store: &PgDoctorProjectionStore,
    reference: &dyn ReferenceDataSource,
    dry_run: bool,
) -> Result<RebuildReport, ProjectionError> {
    let doctors = doctor_write_repo::list_active(write).await?;
    let mut report = RebuildReport::default();
    let mut keep = Vec::with_capacity(doctors.len());

    for doctor in doctors {
        keep.push(doctor.id);

        let Some(specialization) = reference.specialization(doctor.specialization_id).await? else {
            tracing::warn!(
                doctor_id = %doctor.id,
                specialization_id = %doctor.specialization_id,
                "Specialization missing, doctor projection left untouched"
            );
            report.skipped.push(doctor.id);
            continue;
        };

        if !dry_run {
            store
                .upsert(&DoctorReadModel::project(doctor, specialization))
                .await?;
        }
        report.upserted += 1;
    }

    let live: HashSet<Uuid> = keep.iter().copied().collect();
    report.removed = store
        .list_ids()
        .await?
        .into_iter()
        .filter(|id| !live.contains(id))
        .count();

    if !dry_run {
        store.delete_except(&keep).await?;
    }

    tracing::info!(
        upserted = report.upserted,
        removed = report.removed,
        skipped = report.skipped.len(),
        dry_run,
        "Doctor projection rebuilt"
    );

    Ok(report)
}

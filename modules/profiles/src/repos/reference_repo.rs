use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::projections::{ProjectionError, ReferenceDataSource, SpecializationSnapshot};

/// Reads specializations and their services from the write store
#[derive(Clone)]
pub struct PgReferenceData {
    pool: PgPool,
}

impl PgReferenceData {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceDataSource for PgReferenceData {
    async fn specialization(
        &self,
        id: Uuid,
    ) -> Result<Option<SpecializationSnapshot>, ProjectionError> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM write.specializations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(name) = name else {
            return Ok(None);
        };

        // Inactive services are hidden from patients and left out of the copy.
        let services: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT s.name
            FROM write.specialization_services ss
            JOIN write.services s ON s.id = ss.service_id
            WHERE ss.specialization_id = $1 AND s.is_active
            ORDER BY s.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SpecializationSnapshot { id, name, services }))
    }
}

//! Outbox record store
//!
//! All writes take the caller's transaction: inserts ride along with the
//! business mutation, claims and state updates share the dispatcher's cycle
//! transaction so row locks are held until the outcome is committed.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use super::record::OutboxRecord;

/// Append a record inside an open transaction
pub async fn insert_message(
    tx: &mut Transaction<'_, Postgres>,
    record: &OutboxRecord,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO write.outbox_messages
            (id, event_type, payload, occurred_on, processed_on, error, retry_count)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(record.id)
    .bind(&record.event_type)
    .bind(&record.payload)
    .bind(record.occurred_on)
    .bind(record.processed_on)
    .bind(&record.error)
    .bind(record.retry_count)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Lock up to `limit` pending records, oldest first
///
/// Rows already locked by another dispatcher's transaction are skipped, so
/// concurrent instances never claim the same record.
pub async fn claim_pending(
    tx: &mut Transaction<'_, Postgres>,
    limit: i64,
) -> Result<Vec<OutboxRecord>, sqlx::Error> {
    sqlx::query_as::<_, OutboxRecord>(
        r#"
        SELECT id, event_type, payload, occurred_on, processed_on, error, retry_count
        FROM write.outbox_messages
        WHERE processed_on IS NULL
        ORDER BY occurred_on ASC
        LIMIT $1
        FOR UPDATE SKIP LOCKED
        "#,
    )
    .bind(limit)
    .fetch_all(&mut **tx)
    .await
}

/// Write back the mutable columns of each record
pub async fn save_record_states(
    tx: &mut Transaction<'_, Postgres>,
    records: &[OutboxRecord],
) -> Result<(), sqlx::Error> {
    for record in records {
        sqlx::query(
            r#"
            UPDATE write.outbox_messages
            SET processed_on = $2, error = $3, retry_count = $4
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.processed_on)
        .bind(&record.error)
        .bind(record.retry_count)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

/// Most recent dead-lettered records, for operator inspection
pub async fn list_dead_lettered(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<OutboxRecord>, sqlx::Error> {
    sqlx::query_as::<_, OutboxRecord>(
        r#"
        SELECT id, event_type, payload, occurred_on, processed_on, error, retry_count
        FROM write.outbox_messages
        WHERE processed_on IS NOT NULL AND error IS NOT NULL
        ORDER BY processed_on DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Backlog counters exposed on the stats endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OutboxStats {
    pub pending: i64,
    pub processed: i64,
    pub dead_lettered: i64,
}

pub async fn outbox_stats(pool: &PgPool) -> Result<OutboxStats, sqlx::Error> {
    sqlx::query_as::<_, OutboxStats>(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE processed_on IS NULL) AS pending,
            COUNT(*) FILTER (WHERE processed_on IS NOT NULL AND error IS NULL) AS processed,
            COUNT(*) FILTER (WHERE processed_on IS NOT NULL AND error IS NOT NULL) AS dead_lettered
        FROM write.outbox_messages
        "#,
    )
    .fetch_one(pool)
    .await
}

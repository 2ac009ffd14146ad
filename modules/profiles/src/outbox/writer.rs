//! Producer side of the outbox
//!
//! Business code appends events inside the transaction that performs its
//! mutation. The writer never begins or commits a transaction of its own;
//! [`OutboxTransaction`] is the unit-of-work wrapper that pings the notifier
//! once the commit has gone through.

use sqlx::{PgPool, Postgres, Transaction};

use super::notifier::OutboxNotifier;
use super::record::OutboxRecord;
use super::repo;
use crate::events::OutboxEvent;

#[derive(Debug, thiserror::Error)]
pub enum OutboxWriteError {
    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct OutboxWriter {
    notifier: OutboxNotifier,
}

impl OutboxWriter {
    pub fn new(notifier: OutboxNotifier) -> Self {
        Self { notifier }
    }

    /// Append `event` to the outbox within the caller's transaction
    ///
    /// Does not notify: the record is invisible until the caller commits.
    /// Use [`OutboxWriter::begin`] to get notification on commit.
    pub async fn add_message<E: OutboxEvent>(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        event: &E,
    ) -> Result<(), OutboxWriteError> {
        let record = OutboxRecord::from_event(event)?;
        repo::insert_message(tx, &record).await?;

        tracing::debug!(
            record_id = %record.id,
            event_type = %record.event_type,
            "Event appended to outbox"
        );

        Ok(())
    }

    /// Begin a business transaction that can carry outbox records
    pub async fn begin(&self, pool: &PgPool) -> Result<OutboxTransaction, sqlx::Error> {
        Ok(OutboxTransaction {
            tx: pool.begin().await?,
            writer: self.clone(),
            added: 0,
        })
    }
}

/// A write-side transaction plus the outbox records appended to it
///
/// Dropping it without calling [`commit`](Self::commit) rolls everything
/// back, business rows and outbox records alike, and nothing is signalled.
pub struct OutboxTransaction {
    tx: Transaction<'static, Postgres>,
    writer: OutboxWriter,
    added: usize,
}

impl OutboxTransaction {
    /// The underlying transaction, for the business mutation itself
    pub fn transaction(&mut self) -> &mut Transaction<'static, Postgres> {
        &mut self.tx
    }

    pub async fn add_message<E: OutboxEvent>(&mut self, event: &E) -> Result<(), OutboxWriteError> {
        self.writer.add_message(&mut self.tx, event).await?;
        self.added += 1;
        Ok(())
    }

    /// Records appended so far
    pub fn added(&self) -> usize {
        self.added
    }

    /// Commit, then wake the dispatcher once if any record was added
    pub async fn commit(self) -> Result<usize, sqlx::Error> {
        let OutboxTransaction { tx, writer, added } = self;
        tx.commit().await?;

        if added > 0 {
            writer.notifier.notify();
        }

        Ok(added)
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.tx.rollback().await
    }
}

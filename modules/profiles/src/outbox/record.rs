use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::events::OutboxEvent;

/// Width of the `error` column
pub const MAX_ERROR_LEN: usize = 2000;

/// One row of `write.outbox_messages`
///
/// Records are only ever changed through [`OutboxRecord::mark_succeeded`] and
/// [`OutboxRecord::mark_failed`], which return the next state instead of
/// mutating in place; the dispatcher then writes the whole state back.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub occurred_on: DateTime<Utc>,
    pub processed_on: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub retry_count: i32,
}

/// What a pipeline run did to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Processed,
    Retrying { retry_count: i32 },
    DeadLettered { retry_count: i32 },
}

impl OutboxRecord {
    /// Serialize `event` into a fresh pending record
    pub fn from_event<E: OutboxEvent>(event: &E) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: event.event_id(),
            event_type: E::EVENT_TYPE.to_string(),
            payload: serde_json::to_string(event)?,
            occurred_on: event.occurred_on(),
            processed_on: None,
            error: None,
            retry_count: 0,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.processed_on.is_none()
    }

    /// Terminal without ever succeeding
    pub fn is_dead_lettered(&self) -> bool {
        self.processed_on.is_some() && self.error.is_some()
    }

    pub fn mark_succeeded(&self, now: DateTime<Utc>) -> Self {
        Self {
            processed_on: Some(now),
            error: None,
            ..self.clone()
        }
    }

    /// Count a failed attempt; dead-letter once `max_retry_count` is reached
    pub fn mark_failed(&self, error: &str, now: DateTime<Utc>, max_retry_count: i32) -> Self {
        let retry_count = self.retry_count + 1;
        let dead_lettered = retry_count >= max_retry_count;

        Self {
            retry_count,
            error: Some(truncate_error(error)),
            processed_on: if dead_lettered { Some(now) } else { None },
            ..self.clone()
        }
    }

    /// Classify a state produced by the pipeline
    pub fn outcome(&self) -> RecordOutcome {
        match (self.processed_on, &self.error) {
            (Some(_), None) => RecordOutcome::Processed,
            (Some(_), Some(_)) => RecordOutcome::DeadLettered {
                retry_count: self.retry_count,
            },
            (None, _) => RecordOutcome::Retrying {
                retry_count: self.retry_count,
            },
        }
    }
}

fn truncate_error(error: &str) -> String {
    if error.chars().count() <= MAX_ERROR_LEN {
        error.to_string()
    } else {
        error.chars().take(MAX_ERROR_LEN).collect()
    }
}

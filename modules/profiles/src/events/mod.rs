//! Events carried through the outbox
//!
//! Every event type names itself with a stable tag (`EVENT_TYPE`) which is
//! what gets stored in `outbox_messages.event_type` and looked up again in
//! the dispatcher's registry.

pub mod doctor;

pub use doctor::{
    Doctor, DoctorCreatedEvent, DoctorDeletedEvent, DoctorStatus, DoctorStatusChangedEvent,
    DoctorUpdatedEvent,
};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// An event that can be written to and re-hydrated from the outbox
pub trait OutboxEvent: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable tag persisted with the record
    const EVENT_TYPE: &'static str;

    /// Producer-assigned identity, reused as the outbox record id
    fn event_id(&self) -> Uuid;

    /// When the producing transaction happened
    fn occurred_on(&self) -> DateTime<Utc>;
}

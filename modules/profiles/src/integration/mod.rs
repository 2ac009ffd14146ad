//! Integration messages for other services
//!
//! Internal outbox events are translated into stable integration contracts
//! and published to the broker by [`MessagePublisher`].

pub mod doctor_messages;
pub mod publisher;

pub use doctor_messages::{DoctorCreatedMessage, DoctorMessageHandler, DOCTOR_CREATED_ROUTING_KEY};
pub use publisher::{MessagePublisher, PublishError};

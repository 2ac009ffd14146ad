use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::publisher::MessagePublisher;
use crate::events::DoctorCreatedEvent;
use crate::outbox::{EventHandler, HandlerError};

pub const DOCTOR_CREATED_ROUTING_KEY: &str = "doctor.created";

/// Announces a new doctor account to other services (notifications, auth)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorCreatedMessage {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub doctor_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
}

impl From<&DoctorCreatedEvent> for DoctorCreatedMessage {
    fn from(event: &DoctorCreatedEvent) -> Self {
        Self {
            event_id: event.event_id,
            occurred_on: event.occurred_on,
            doctor_id: event.doctor_id,
            email: event.email.clone(),
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            middle_name: event.middle_name.clone(),
        }
    }
}

pub struct DoctorMessageHandler {
    publisher: MessagePublisher,
}

impl DoctorMessageHandler {
    pub fn new(publisher: MessagePublisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl EventHandler<DoctorCreatedEvent> for DoctorMessageHandler {
    fn name(&self) -> &'static str {
        "doctor_messages"
    }

    async fn handle(&self, event: &DoctorCreatedEvent) -> Result<(), HandlerError> {
        let message = DoctorCreatedMessage::from(event);
        self.publisher
            .publish(&message, DOCTOR_CREATED_ROUTING_KEY)
            .await?;

        tracing::info!(
            doctor_id = %event.doctor_id,
            event_id = %event.event_id,
            "DoctorCreated integration message published"
        );
        Ok(())
    }
}

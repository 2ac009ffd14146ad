use event_bus::{BusError, EventBus};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("failed to serialize message: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Publishes JSON integration messages onto `<exchange>.<routing_key>`
///
/// Performs a single attempt; retries belong to the outbox record that
/// triggered the publish.
#[derive(Clone)]
pub struct MessagePublisher {
    bus: Arc<dyn EventBus>,
    exchange: String,
}

impl MessagePublisher {
    pub fn new(bus: Arc<dyn EventBus>, exchange: impl Into<String>) -> Self {
        Self {
            bus,
            exchange: exchange.into(),
        }
    }

    pub fn subject(&self, routing_key: &str) -> String {
        format!("{}.{}", self.exchange, routing_key)
    }

    pub async fn publish<T: Serialize + Sync>(
        &self,
        message: &T,
        routing_key: &str,
    ) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(message)?;
        let subject = self.subject(routing_key);

        self.bus.publish_json(&subject, payload).await?;

        tracing::debug!(subject = %subject, "Integration message published");
        Ok(())
    }
}

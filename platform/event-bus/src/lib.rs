//! # EventBus Abstraction
//!
//! The broker seam for integration events leaving a service. Services never
//! talk to the broker directly; they publish through `Arc<dyn EventBus>` so the
//! transport can be swapped by configuration.
//!
//! ## Implementations
//!
//! - **NatsBus**: Production implementation. In durable mode it publishes
//!   through NATS JetStream into a file-backed stream and waits for the ack.
//! - **InMemoryBus**: Test/dev implementation using in-memory channels
//!
//! ## Subjects
//!
//! Subjects are dot-separated routing keys prefixed with an exchange name,
//! e.g. `innoclinic.doctor.created`. Subscriptions accept the NATS wildcards
//! `*` (one token) and `>` (one or more tokens).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use event_bus::{EventBus, InMemoryBus, NatsBus, StreamSpec};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Production: durable NATS JetStream
//! let nats_client = async_nats::connect("nats://localhost:4222").await?;
//! let bus: Arc<dyn EventBus> =
//!     Arc::new(NatsBus::durable(nats_client, StreamSpec::for_exchange("innoclinic")).await?);
//!
//! // Dev/Test: In-Memory
//! let bus: Arc<dyn EventBus> = Arc::new(InMemoryBus::new());
//!
//! let payload = br#"{"doctor_id":"..."}"#.to_vec();
//! bus.publish_json("innoclinic.doctor.created", payload).await?;
//! # Ok(())
//! # }
//! ```

mod inmemory_bus;
mod nats_bus;

pub use inmemory_bus::InMemoryBus;
pub use nats_bus::{NatsBus, StreamSpec};

use async_trait::async_trait;
use futures::stream::BoxStream;
use std::collections::HashMap;
use std::fmt;

/// Header carrying the payload media type.
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Media type of every JSON payload published through [`EventBus::publish_json`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A message received from the event bus
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// The subject/topic this message was published to
    pub subject: String,
    /// The message payload (raw bytes)
    pub payload: Vec<u8>,
    /// Optional headers
    pub headers: Option<HashMap<String, String>>,
    /// Optional reply-to subject (for request-response patterns)
    pub reply_to: Option<String>,
}

impl BusMessage {
    /// Create a new bus message
    pub fn new(subject: String, payload: Vec<u8>) -> Self {
        Self {
            subject,
            payload,
            headers: None,
            reply_to: None,
        }
    }

    /// Add headers to the message
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Add a reply-to subject
    pub fn with_reply_to(mut self, reply_to: String) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Look up a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(name))
            .map(String::as_str)
    }
}

/// Errors that can occur when using the event bus
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish message: {0}")]
    PublishError(String),

    #[error("failed to subscribe to subject: {0}")]
    SubscribeError(String),

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("invalid subject pattern: {0}")]
    InvalidSubject(String),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Core event bus abstraction for publish-subscribe messaging
///
/// Implementations perform no retries of their own: a failed publish is
/// returned to the caller, which owns the retry policy.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish a message to a subject
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()>;

    /// Publish a message carrying headers
    ///
    /// The default implementation drops the headers; transports that can carry
    /// them override this.
    async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        let _ = headers;
        self.publish(subject, payload).await
    }

    /// Publish a JSON document, marking it with `Content-Type: application/json`
    async fn publish_json(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        let headers = HashMap::from([(
            CONTENT_TYPE_HEADER.to_string(),
            JSON_CONTENT_TYPE.to_string(),
        )]);
        self.publish_with_headers(subject, headers, payload).await
    }

    /// Subscribe to messages matching a subject pattern
    ///
    /// * `*` matches a single token (e.g., `innoclinic.*.created`)
    /// * `>` matches one or more tokens (e.g., `innoclinic.>`)
    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>>;
}

impl fmt::Debug for dyn EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventBus")
    }
}

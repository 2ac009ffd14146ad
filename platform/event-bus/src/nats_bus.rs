//! NATS-based implementation of the EventBus trait

use crate::{BusError, BusMessage, BusResult, EventBus};
use async_nats::jetstream::{self, stream::StorageType};
use async_nats::{Client, HeaderMap};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use std::collections::HashMap;
use std::time::Duration;

/// Durable stream backing an exchange
///
/// Every subject under `<exchange>.>` is captured by one file-backed
/// JetStream stream, which is what makes a publish persistent.
#[derive(Debug, Clone)]
pub struct StreamSpec {
    pub name: String,
    pub subjects: Vec<String>,
    pub max_age: Duration,
}

impl StreamSpec {
    /// Stream covering every routing key of `exchange`, kept for 14 days.
    pub fn for_exchange(exchange: &str) -> Self {
        Self {
            name: exchange.to_uppercase().replace(['.', '-'], "_"),
            subjects: vec![format!("{}.>", exchange)],
            max_age: Duration::from_secs(60 * 60 * 24 * 14),
        }
    }
}

/// EventBus implementation using NATS
///
/// Built with [`NatsBus::new`] it publishes fire-and-forget on core NATS.
/// Built with [`NatsBus::durable`] it publishes through JetStream and only
/// reports success once the server has acknowledged and stored the message.
#[derive(Clone)]
pub struct NatsBus {
    client: Client,
    jetstream: Option<jetstream::Context>,
}

impl NatsBus {
    /// Create a new NatsBus on core NATS from an existing client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            jetstream: None,
        }
    }

    /// Create a NatsBus that publishes into a durable JetStream stream
    ///
    /// The stream is created when missing; an existing stream is reused as-is.
    pub async fn durable(client: Client, spec: StreamSpec) -> BusResult<Self> {
        let js = jetstream::new(client.clone());

        js.get_or_create_stream(jetstream::stream::Config {
            name: spec.name.clone(),
            subjects: spec.subjects.clone(),
            storage: StorageType::File,
            max_age: spec.max_age,
            ..Default::default()
        })
        .await
        .map_err(|e| BusError::ConnectionError(format!("stream {}: {}", spec.name, e)))?;

        tracing::info!(stream = %spec.name, subjects = ?spec.subjects, "JetStream stream ready");

        Ok(Self {
            client,
            jetstream: Some(js),
        })
    }

    /// Get a reference to the underlying NATS client
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn to_header_map(headers: &HashMap<String, String>) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (key, value) in headers {
            map.insert(key.as_str(), value.as_str());
        }
        map
    }
}

#[async_trait]
impl EventBus for NatsBus {
    async fn publish(&self, subject: &str, payload: Vec<u8>) -> BusResult<()> {
        self.publish_with_headers(subject, HashMap::new(), payload).await
    }

    async fn publish_with_headers(
        &self,
        subject: &str,
        headers: HashMap<String, String>,
        payload: Vec<u8>,
    ) -> BusResult<()> {
        let headers = Self::to_header_map(&headers);

        match &self.jetstream {
            Some(js) => {
                let ack = js
                    .publish_with_headers(subject.to_string(), headers, payload.into())
                    .await
                    .map_err(|e| BusError::PublishError(e.to_string()))?;
                ack.await
                    .map_err(|e| BusError::PublishError(format!("no ack for {}: {}", subject, e)))?;
            }
            None => {
                self.client
                    .publish_with_headers(subject.to_string(), headers, payload.into())
                    .await
                    .map_err(|e| BusError::PublishError(e.to_string()))?;
            }
        }

        Ok(())
    }

    async fn subscribe(&self, subject: &str) -> BusResult<BoxStream<'static, BusMessage>> {
        let subscriber = self
            .client
            .subscribe(subject.to_string())
            .await
            .map_err(|e| BusError::SubscribeError(e.to_string()))?;

        let stream = subscriber.map(|nats_msg| {
            let mut msg = BusMessage::new(nats_msg.subject.to_string(), nats_msg.payload.to_vec());

            if let Some(reply) = nats_msg.reply {
                msg = msg.with_reply_to(reply.to_string());
            }

            if let Some(nats_headers) = nats_msg.headers {
                let mut headers = HashMap::new();
                for (key, values) in nats_headers.iter() {
                    if let Some(value) = values.first() {
                        headers.insert(key.to_string(), value.as_str().to_string());
                    }
                }
                if !headers.is_empty() {
                    msg = msg.with_headers(headers);
                }
            }

            msg
        });

        Ok(stream.boxed())
    }
}

//! Explicit mapping from stored `event_type` tags to typed handlers
//!
//! Populated once at startup. Each tag decodes its payload into exactly one
//! Rust type and hands it to that type's handlers in registration order.

use async_trait::async_trait;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::events::OutboxEvent;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// In-process subscriber for one event type
#[async_trait]
pub trait EventHandler<E: OutboxEvent>: Send + Sync {
    /// Name used in logs and recorded errors
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &E) -> Result<(), HandlerError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("unknown event type '{0}'")]
    UnknownEventType(String),

    #[error("malformed payload for {event_type}: {source}")]
    Deserialize {
        event_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("handler {handler} failed: {message}")]
    Handler {
        handler: &'static str,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("event type '{0}' is already registered for a different Rust type")]
    ConflictingType(&'static str),
}

#[async_trait]
trait Route: Send + Sync {
    async fn dispatch(&self, event_type: &str, payload: &str) -> Result<(), DispatchError>;

    fn handler_count(&self) -> usize;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedRoute<E: OutboxEvent> {
    handlers: Vec<Arc<dyn EventHandler<E>>>,
}

#[async_trait]
impl<E: OutboxEvent> Route for TypedRoute<E> {
    async fn dispatch(&self, event_type: &str, payload: &str) -> Result<(), DispatchError> {
        let event: E =
            serde_json::from_str(payload).map_err(|source| DispatchError::Deserialize {
                event_type: event_type.to_string(),
                source,
            })?;

        for handler in &self.handlers {
            handler
                .handle(&event)
                .await
                .map_err(|e| DispatchError::Handler {
                    handler: handler.name(),
                    message: e.to_string(),
                })?;
        }

        Ok(())
    }

    fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[derive(Default)]
pub struct EventRegistry {
    routes: HashMap<&'static str, (TypeId, Box<dyn Route>)>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to events tagged `E::EVENT_TYPE`
    pub fn register<E: OutboxEvent>(
        &mut self,
        handler: Arc<dyn EventHandler<E>>,
    ) -> Result<&mut Self, RegistryError> {
        let (type_id, route) = self.routes.entry(E::EVENT_TYPE).or_insert_with(|| {
            (
                TypeId::of::<E>(),
                Box::new(TypedRoute::<E> {
                    handlers: Vec::new(),
                }) as Box<dyn Route>,
            )
        });

        if *type_id != TypeId::of::<E>() {
            return Err(RegistryError::ConflictingType(E::EVENT_TYPE));
        }

        let typed = route
            .as_any_mut()
            .downcast_mut::<TypedRoute<E>>()
            .ok_or(RegistryError::ConflictingType(E::EVENT_TYPE))?;
        typed.handlers.push(handler);

        Ok(self)
    }

    pub fn is_registered(&self, event_type: &str) -> bool {
        self.routes.contains_key(event_type)
    }

    pub fn handler_count(&self, event_type: &str) -> usize {
        self.routes
            .get(event_type)
            .map(|(_, route)| route.handler_count())
            .unwrap_or(0)
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.routes.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Resolve, decode and hand the payload to every handler of its type
    ///
    /// Stops at the first failing step.
    pub async fn dispatch(&self, event_type: &str, payload: &str) -> Result<(), DispatchError> {
        let (_, route) = self
            .routes
            .get(event_type)
            .ok_or_else(|| DispatchError::UnknownEventType(event_type.to_string()))?;

        route.dispatch(event_type, payload).await
    }
}

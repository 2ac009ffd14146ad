//! Startup wiring shared by the service binary and the integration tests

use event_bus::EventBus;
use sqlx::PgPool;
use std::sync::Arc;

use crate::events::{
    DoctorCreatedEvent, DoctorDeletedEvent, DoctorStatusChangedEvent, DoctorUpdatedEvent,
};
use crate::integration::{DoctorMessageHandler, MessagePublisher};
use crate::outbox::{EventHandler, EventRegistry, RegistryError};
use crate::projections::DoctorProjectionHandler;
use crate::repos::{PgDoctorProjectionStore, PgReferenceData};

/// Register every in-process handler
///
/// The projection runs before the integration message for `DoctorCreatedEvent`,
/// so a failed projection never announces a doctor that cannot be read back.
pub fn build_registry(
    projection: Arc<DoctorProjectionHandler>,
    messages: Arc<dyn EventHandler<DoctorCreatedEvent>>,
) -> Result<EventRegistry, RegistryError> {
    let mut registry = EventRegistry::new();
    registry
        .register::<DoctorCreatedEvent>(projection.clone())?
        .register::<DoctorCreatedEvent>(messages)?
        .register::<DoctorUpdatedEvent>(projection.clone())?
        .register::<DoctorStatusChangedEvent>(projection.clone())?
        .register::<DoctorDeletedEvent>(projection)?;

    tracing::info!(event_types = ?registry.event_types(), "Outbox handlers registered");
    Ok(registry)
}

/// Postgres-backed projection handler over the given stores
pub fn doctor_projection(write: &PgPool, read: &PgPool) -> Arc<DoctorProjectionHandler> {
    Arc::new(DoctorProjectionHandler::new(
        Arc::new(PgDoctorProjectionStore::new(read.clone())),
        Arc::new(PgReferenceData::new(write.clone())),
    ))
}

/// Registry for the running service
pub fn service_registry(
    write: &PgPool,
    read: &PgPool,
    bus: Arc<dyn EventBus>,
    exchange: &str,
) -> Result<EventRegistry, RegistryError> {
    let publisher = MessagePublisher::new(bus, exchange);
    build_registry(
        doctor_projection(write, read),
        Arc::new(DoctorMessageHandler::new(publisher)),
    )
}

//! Transactional outbox
//!
//! Events are written to `write.outbox_messages` in the same transaction as
//! the business change that produced them, then delivered asynchronously by
//! the [`OutboxDispatcher`] to in-process handlers (read-model projections,
//! integration publishing).

pub mod dispatcher;
pub mod notifier;
pub mod record;
pub mod registry;
pub mod repo;
pub mod writer;

pub use dispatcher::{
    process_record, CycleReport, DispatcherError, DispatcherState, OutboxDispatcher, RunSummary,
};
pub use notifier::{OutboxNotifier, WakeReason};
pub use record::{OutboxRecord, RecordOutcome};
pub use registry::{DispatchError, EventHandler, EventRegistry, HandlerError, RegistryError};
pub use repo::OutboxStats;
pub use writer::{OutboxTransaction, OutboxWriteError, OutboxWriter};

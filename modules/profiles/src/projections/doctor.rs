use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    DoctorProjectionStore, DoctorReadModel, ProjectionError, ReferenceDataSource,
    SpecializationSnapshot,
};
use crate::events::{
    DoctorCreatedEvent, DoctorDeletedEvent, DoctorStatusChangedEvent, DoctorUpdatedEvent,
};
use crate::outbox::{EventHandler, HandlerError};

/// Keeps `read.doctors` in step with the doctor event stream
///
/// All four handlers are safe to replay: a duplicate create is a no-op, an
/// update recreates a missing row, status and delete are plain overwrites.
pub struct DoctorProjectionHandler {
    store: Arc<dyn DoctorProjectionStore>,
    reference: Arc<dyn ReferenceDataSource>,
}

impl DoctorProjectionHandler {
    pub fn new(store: Arc<dyn DoctorProjectionStore>, reference: Arc<dyn ReferenceDataSource>) -> Self {
        Self { store, reference }
    }

    async fn specialization(&self, id: Uuid) -> Result<SpecializationSnapshot, ProjectionError> {
        self.reference
            .specialization(id)
            .await?
            .ok_or(ProjectionError::SpecializationNotFound(id))
    }

    pub async fn on_created(&self, event: &DoctorCreatedEvent) -> Result<(), ProjectionError> {
        if self.store.exists(event.doctor_id).await? {
            tracing::debug!(doctor_id = %event.doctor_id, "Doctor projection already exists, skipping");
            return Ok(());
        }

        let specialization = self.specialization(event.specialization_id).await?;
        let inserted = self
            .store
            .insert(&DoctorReadModel::project(event.doctor(), specialization))
            .await?;

        tracing::info!(doctor_id = %event.doctor_id, inserted, "Doctor projection created");
        Ok(())
    }

    pub async fn on_updated(&self, event: &DoctorUpdatedEvent) -> Result<(), ProjectionError> {
        let specialization = self.specialization(event.specialization_id).await?;
        let model = DoctorReadModel::project(event.doctor(), specialization);

        // Recreates the row when the create was lost or a delete was replayed
        // first, and overwrites a create applied concurrently by another
        // dispatcher.
        self.store.upsert(&model).await?;

        tracing::info!(doctor_id = %event.doctor_id, "Doctor projection updated");
        Ok(())
    }

    pub async fn on_status_changed(
        &self,
        event: &DoctorStatusChangedEvent,
    ) -> Result<(), ProjectionError> {
        let updated = self
            .store
            .update_status(event.doctor_id, event.new_status)
            .await?;

        if !updated {
            tracing::warn!(
                doctor_id = %event.doctor_id,
                new_status = ?event.new_status,
                "Status change for doctor without projection"
            );
        }

        Ok(())
    }

    pub async fn on_deleted(&self, event: &DoctorDeletedEvent) -> Result<(), ProjectionError> {
        let deleted = self.store.delete(event.doctor_id).await?;
        tracing::info!(doctor_id = %event.doctor_id, deleted, "Doctor projection removed");
        Ok(())
    }
}

const HANDLER_NAME: &str = "doctor_projection";

#[async_trait]
impl EventHandler<DoctorCreatedEvent> for DoctorProjectionHandler {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    async fn handle(&self, event: &DoctorCreatedEvent) -> Result<(), HandlerError> {
        Ok(self.on_created(event).await?)
    }
}

#[async_trait]
impl EventHandler<DoctorUpdatedEvent> for DoctorProjectionHandler {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    async fn handle(&self, event: &DoctorUpdatedEvent) -> Result<(), HandlerError> {
        Ok(self.on_updated(event).await?)
    }
}

#[async_trait]
impl EventHandler<DoctorStatusChangedEvent> for DoctorProjectionHandler {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    async fn handle(&self, event: &DoctorStatusChangedEvent) -> Result<(), HandlerError> {
        Ok(self.on_status_changed(event).await?)
    }
}

#[async_trait]
impl EventHandler<DoctorDeletedEvent> for DoctorProjectionHandler {
    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    async fn handle(&self, event: &DoctorDeletedEvent) -> Result<(), HandlerError> {
        Ok(self.on_deleted(event).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DoctorStatus;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<Uuid, DoctorReadModel>>,
    }

    #[async_trait]
    impl DoctorProjectionStore for MemoryStore {
        async fn exists(&self, id: Uuid) -> Result<bool, ProjectionError> {
            Ok(self.rows.lock().unwrap().contains_key(&id))
        }

        async fn get(&self, id: Uuid) -> Result<Option<DoctorReadModel>, ProjectionError> {
            Ok(self.rows.lock().unwrap().get(&id).cloned())
        }

        async fn insert(&self, doctor: &DoctorReadModel) -> Result<bool, ProjectionError> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&doctor.id) {
                return Ok(false);
            }
            rows.insert(doctor.id, doctor.clone());
            Ok(true)
        }

        async fn upsert(&self, doctor: &DoctorReadModel) -> Result<(), ProjectionError> {
            self.rows.lock().unwrap().insert(doctor.id, doctor.clone());
            Ok(())
        }

        async fn update_status(&self, id: Uuid, status: DoctorStatus) -> Result<bool, ProjectionError> {
            let mut rows = self.rows.lock().unwrap();
            match rows.get_mut(&id) {
                Some(row) => {
                    row.status = status;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ProjectionError> {
            Ok(self.rows.lock().unwrap().remove(&id).is_some())
        }
    }

    struct Specializations(Mutex<HashMap<Uuid, SpecializationSnapshot>>);

    #[async_trait]
    impl ReferenceDataSource for Specializations {
        async fn specialization(
            &self,
            id: Uuid,
        ) -> Result<Option<SpecializationSnapshot>, ProjectionError> {
            Ok(self.0.lock().unwrap().get(&id).cloned())
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        reference: Arc<Specializations>,
        handler: DoctorProjectionHandler,
        cardiology: Uuid,
    }

    fn fixture() -> Fixture {
        let cardiology = Uuid::new_v4();
        let reference = Arc::new(Specializations(Mutex::new(HashMap::from([(
            cardiology,
            SpecializationSnapshot {
                id: cardiology,
                name: "Cardiology".to_string(),
                services: vec!["ECG".to_string(), "Echocardiography".to_string()],
            },
        )]))));
        let store = Arc::new(MemoryStore::default());
        let handler = DoctorProjectionHandler::new(store.clone(), reference.clone());

        Fixture {
            store,
            reference,
            handler,
            cardiology,
        }
    }

    fn created(doctor_id: Uuid, specialization_id: Uuid) -> DoctorCreatedEvent {
        DoctorCreatedEvent {
            event_id: Uuid::new_v4(),
            occurred_on: Utc::now(),
            doctor_id,
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            middle_name: None,
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            email: "anna.petrova@clinic.test".to_string(),
            photo_url: None,
            career_start_year: 2010,
            specialization_id,
            status: DoctorStatus::AtWork,
        }
    }

    fn updated(doctor_id: Uuid, specialization_id: Uuid) -> DoctorUpdatedEvent {
        DoctorUpdatedEvent {
            event_id: Uuid::new_v4(),
            occurred_on: Utc::now(),
            doctor_id,
            first_name: "Anna".to_string(),
            last_name: "Sidorova".to_string(),
            middle_name: Some("Ivanovna".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            email: "anna.sidorova@clinic.test".to_string(),
            photo_url: Some("https://cdn.clinic.test/anna.png".to_string()),
            career_start_year: 2011,
            specialization_id,
            status: DoctorStatus::OnVacation,
        }
    }

    #[tokio::test]
    async fn test_created_denormalizes_reference_data() {
        let f = fixture();
        let doctor_id = Uuid::new_v4();

        f.handler.on_created(&created(doctor_id, f.cardiology)).await.unwrap();

        let row = f.store.get(doctor_id).await.unwrap().unwrap();
        assert_eq!(row.specialization_id, f.cardiology);
        assert_eq!(row.specialization_name, "Cardiology");
        assert_eq!(row.services, vec!["ECG", "Echocardiography"]);
        assert_eq!(row.status, DoctorStatus::AtWork);
    }

    #[tokio::test]
    async fn test_duplicate_created_is_idempotent() {
        let f = fixture();
        let doctor_id = Uuid::new_v4();
        let event = created(doctor_id, f.cardiology);

        f.handler.on_created(&event).await.unwrap();
        let once = f.store.get(doctor_id).await.unwrap();

        // Reference data drifting must not leak into a replayed create.
        f.reference.0.lock().unwrap().get_mut(&f.cardiology).unwrap().name =
            "Cardiac Surgery".to_string();
        f.handler.on_created(&event).await.unwrap();
        let twice = f.store.get(doctor_id).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(f.store.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_updated_replaces_every_field() {
        let f = fixture();
        let doctor_id = Uuid::new_v4();
        f.handler.on_created(&created(doctor_id, f.cardiology)).await.unwrap();

        let event = updated(doctor_id, f.cardiology);
        f.handler.on_updated(&event).await.unwrap();

        let row = f.store.get(doctor_id).await.unwrap().unwrap();
        assert_eq!(row.last_name, "Sidorova");
        assert_eq!(row.middle_name.as_deref(), Some("Ivanovna"));
        assert_eq!(row.email, "anna.sidorova@clinic.test");
        assert_eq!(row.career_start_year, 2011);
        assert_eq!(row.status, DoctorStatus::OnVacation);
    }

    #[tokio::test]
    async fn test_status_change_touches_only_status() {
        let f = fixture();
        let doctor_id = Uuid::new_v4();
        f.handler.on_created(&created(doctor_id, f.cardiology)).await.unwrap();
        let before = f.store.get(doctor_id).await.unwrap().unwrap();

        f.handler
            .on_status_changed(&DoctorStatusChangedEvent {
                event_id: Uuid::new_v4(),
                occurred_on: Utc::now(),
                doctor_id,
                old_status: DoctorStatus::AtWork,
                new_status: DoctorStatus::SickLeave,
            })
            .await
            .unwrap();

        let after = f.store.get(doctor_id).await.unwrap().unwrap();
        assert_eq!(after.status, DoctorStatus::SickLeave);
        assert_eq!(
            DoctorReadModel {
                status: before.status,
                ..after
            },
            before
        );
    }

    #[tokio::test]
    async fn test_status_change_for_missing_row_is_not_an_error() {
        let f = fixture();
        let result = f
            .handler
            .on_status_changed(&DoctorStatusChangedEvent {
                event_id: Uuid::new_v4(),
                occurred_on: Utc::now(),
                doctor_id: Uuid::new_v4(),
                old_status: DoctorStatus::AtWork,
                new_status: DoctorStatus::Inactive,
            })
            .await;

        assert!(result.is_ok());
        assert!(f.store.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_then_updated_recreates_row() {
        let f = fixture();
        let doctor_id = Uuid::new_v4();
        f.handler.on_created(&created(doctor_id, f.cardiology)).await.unwrap();

        let deleted = DoctorDeletedEvent {
            event_id: Uuid::new_v4(),
            occurred_on: Utc::now(),
            doctor_id,
        };
        f.handler.on_deleted(&deleted).await.unwrap();
        assert!(!f.store.exists(doctor_id).await.unwrap());

        // Replaying the delete is harmless.
        f.handler.on_deleted(&deleted).await.unwrap();

        f.handler.on_updated(&updated(doctor_id, f.cardiology)).await.unwrap();

        let row = f.store.get(doctor_id).await.unwrap().unwrap();
        assert_eq!(row.last_name, "Sidorova");
        assert_eq!(row.specialization_name, "Cardiology");
    }

    /// Lands a concurrent dispatcher's create between the update's
    /// lookup and its write.
    struct CreateLandsMidUpdate {
        inner: MemoryStore,
        stale: Mutex<Option<DoctorReadModel>>,
    }

    #[async_trait]
    impl DoctorProjectionStore for CreateLandsMidUpdate {
        async fn exists(&self, id: Uuid) -> Result<bool, ProjectionError> {
            self.inner.exists(id).await
        }

        async fn get(&self, id: Uuid) -> Result<Option<DoctorReadModel>, ProjectionError> {
            self.inner.get(id).await
        }

        async fn insert(&self, doctor: &DoctorReadModel) -> Result<bool, ProjectionError> {
            self.inner.insert(doctor).await
        }

        async fn upsert(&self, doctor: &DoctorReadModel) -> Result<(), ProjectionError> {
            let stale = self.stale.lock().unwrap().take();
            if let Some(stale) = stale {
                assert!(self.inner.insert(&stale).await?);
            }
            self.inner.upsert(doctor).await
        }

        async fn update_status(&self, id: Uuid, status: DoctorStatus) -> Result<bool, ProjectionError> {
            self.inner.update_status(id, status).await
        }

        async fn delete(&self, id: Uuid) -> Result<bool, ProjectionError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_update_wins_over_create_landing_mid_update() {
        let f = fixture();
        let doctor_id = Uuid::new_v4();
        let stale = DoctorReadModel::project(
            created(doctor_id, f.cardiology).doctor(),
            f.reference.specialization(f.cardiology).await.unwrap().unwrap(),
        );
        let store = Arc::new(CreateLandsMidUpdate {
            inner: MemoryStore::default(),
            stale: Mutex::new(Some(stale)),
        });
        let handler = DoctorProjectionHandler::new(store.clone(), f.reference.clone());

        handler.on_updated(&updated(doctor_id, f.cardiology)).await.unwrap();
        // The create's own event is then replayed by the second dispatcher.
        handler.on_created(&created(doctor_id, f.cardiology)).await.unwrap();

        let row = store.get(doctor_id).await.unwrap().unwrap();
        assert_eq!(row.last_name, "Sidorova");
        assert_eq!(row.status, DoctorStatus::OnVacation);
        assert!(store.stale.lock().unwrap().is_none());
    }

    #[test]
    fn test_project_takes_specialization_from_snapshot() {
        let spec = SpecializationSnapshot {
            id: Uuid::new_v4(),
            name: "Neurology".to_string(),
            services: vec!["EEG".to_string()],
        };
        let event = updated(Uuid::new_v4(), spec.id);

        let model = DoctorReadModel::project(event.doctor(), spec.clone());

        assert_eq!(model.id, event.doctor_id);
        assert_eq!(model.middle_name.as_deref(), Some("Ivanovna"));
        assert_eq!(model.photo_url.as_deref(), Some("https://cdn.clinic.test/anna.png"));
        assert_eq!(model.specialization_id, spec.id);
        assert_eq!(model.specialization_name, "Neurology");
        assert_eq!(model.services, vec!["EEG"]);
    }

    #[tokio::test]
    async fn test_missing_specialization_fails_the_handler() {
        let f = fixture();
        let unknown = Uuid::new_v4();

        let err = f
            .handler
            .on_created(&created(Uuid::new_v4(), unknown))
            .await
            .unwrap_err();

        assert!(matches!(err, ProjectionError::SpecializationNotFound(id) if id == unknown));
        assert!(f.store.rows.lock().unwrap().is_empty());
    }
}

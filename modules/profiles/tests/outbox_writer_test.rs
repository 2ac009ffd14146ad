//! Outbox writer atomicity against Postgres
//!
//! Run with: cargo test -p profiles-rs --test outbox_writer_test -- --ignored

mod common;

use chrono::Utc;
use common::{doctor_profile, get_test_pool, outbox_records, reset_tables, seed_cardiology};
use profiles_rs::events::{DoctorCreatedEvent, DoctorStatus, OutboxEvent};
use profiles_rs::outbox::{OutboxNotifier, OutboxWriter, WakeReason};
use profiles_rs::repos::doctor_write_repo::{self, Doctor};
use profiles_rs::services::{DoctorService, DoctorServiceError};
use serial_test::serial;
use std::time::Duration;
use uuid::Uuid;

#[tokio::test]
#[serial]
#[ignore]
async fn test_commit_persists_business_row_and_outbox_record() {
    let pool = get_test_pool().await;
    reset_tables(&pool).await;
    let specialization_id = seed_cardiology(&pool).await;

    let notifier = OutboxNotifier::new();
    let service = DoctorService::new(pool.clone(), OutboxWriter::new(notifier.clone()));

    let doctor = service
        .create_doctor(doctor_profile(specialization_id))
        .await
        .expect("create_doctor failed");

    let stored = doctor_write_repo::find_active(&pool, doctor.id).await.unwrap();
    assert_eq!(stored, Some(doctor.clone()));

    let records = outbox_records(&pool).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event_type, DoctorCreatedEvent::EVENT_TYPE);
    assert_eq!(records[0].retry_count, 0);
    assert!(records[0].is_pending());

    let payload: DoctorCreatedEvent = serde_json::from_str(&records[0].payload).unwrap();
    assert_eq!(payload.doctor_id, doctor.id);
    assert_eq!(payload.event_id, records[0].id);

    assert_eq!(
        notifier.wait(Duration::from_millis(100)).await,
        WakeReason::Notified
    );
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_rollback_discards_business_row_and_outbox_record() {
    let pool = get_test_pool().await;
    reset_tables(&pool).await;
    let specialization_id = seed_cardiology(&pool).await;

    let notifier = OutboxNotifier::new();
    let writer = OutboxWriter::new(notifier.clone());

    let doctor = Doctor {
        id: Uuid::new_v4(),
        first_name: "Pavel".to_string(),
        last_name: "Orlov".to_string(),
        middle_name: None,
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1975, 1, 30).unwrap(),
        email: "pavel.orlov@clinic.test".to_string(),
        photo_url: None,
        career_start_year: 2000,
        status: DoctorStatus::AtWork,
        specialization_id,
    };

    let mut tx = writer.begin(&pool).await.unwrap();
    doctor_write_repo::insert_doctor(tx.transaction(), &doctor)
        .await
        .unwrap();
    tx.add_message(&DoctorCreatedEvent {
        event_id: Uuid::new_v4(),
        occurred_on: Utc::now(),
        doctor_id: doctor.id,
        first_name: doctor.first_name.clone(),
        last_name: doctor.last_name.clone(),
        middle_name: None,
        date_of_birth: doctor.date_of_birth,
        email: doctor.email.clone(),
        photo_url: None,
        career_start_year: doctor.career_start_year,
        specialization_id,
        status: doctor.status,
    })
    .await
    .unwrap();
    assert_eq!(tx.added(), 1);
    tx.rollback().await.unwrap();

    assert_eq!(doctor_write_repo::find_active(&pool, doctor.id).await.unwrap(), None);
    assert!(outbox_records(&pool).await.is_empty());
    assert_eq!(
        notifier.wait(Duration::from_millis(50)).await,
        WakeReason::TimedOut
    );
}

#[tokio::test]
#[serial]
#[ignore]
async fn test_failed_command_writes_no_event() {
    let pool = get_test_pool().await;
    reset_tables(&pool).await;
    let specialization_id = seed_cardiology(&pool).await;

    let service = DoctorService::new(pool.clone(), OutboxWriter::new(OutboxNotifier::new()));
    let missing = Uuid::new_v4();

    let err = service
        .edit_doctor(missing, doctor_profile(specialization_id))
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorServiceError::NotFound(id) if id == missing));

    let err = service
        .change_doctor_status(missing, DoctorStatus::Inactive)
        .await
        .unwrap_err();
    assert!(matches!(err, DoctorServiceError::NotFound(_)));

    assert!(outbox_records(&pool).await.is_empty());
}

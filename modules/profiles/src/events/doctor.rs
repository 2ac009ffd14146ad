use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OutboxEvent;

/// Working status of a doctor, persisted as its integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DoctorStatus {
    Unknown,
    #[default]
    AtWork,
    OnVacation,
    SickDay,
    SickLeave,
    SelfIsolation,
    LeaveWithoutPay,
    Inactive,
}

impl DoctorStatus {
    pub fn code(self) -> i32 {
        match self {
            DoctorStatus::Unknown => 0,
            DoctorStatus::AtWork => 1,
            DoctorStatus::OnVacation => 2,
            DoctorStatus::SickDay => 3,
            DoctorStatus::SickLeave => 4,
            DoctorStatus::SelfIsolation => 5,
            DoctorStatus::LeaveWithoutPay => 6,
            DoctorStatus::Inactive => 7,
        }
    }

    /// Unrecognised codes map to `Unknown` rather than failing a read.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => DoctorStatus::AtWork,
            2 => DoctorStatus::OnVacation,
            3 => DoctorStatus::SickDay,
            4 => DoctorStatus::SickLeave,
            5 => DoctorStatus::SelfIsolation,
            6 => DoctorStatus::LeaveWithoutPay,
            7 => DoctorStatus::Inactive,
            _ => DoctorStatus::Unknown,
        }
    }
}

/// Current profile of a doctor
///
/// The shape shared by the write store, the full-profile events and the
/// read-model builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub photo_url: Option<String>,
    pub career_start_year: i32,
    pub status: DoctorStatus,
    pub specialization_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorCreatedEvent {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub doctor_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub photo_url: Option<String>,
    pub career_start_year: i32,
    pub specialization_id: Uuid,
    pub status: DoctorStatus,
}

/// Full replacement of a doctor's profile fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorUpdatedEvent {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub doctor_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: Option<String>,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub photo_url: Option<String>,
    pub career_start_year: i32,
    pub specialization_id: Uuid,
    pub status: DoctorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorStatusChangedEvent {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub doctor_id: Uuid,
    pub old_status: DoctorStatus,
    pub new_status: DoctorStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorDeletedEvent {
    pub event_id: Uuid,
    pub occurred_on: DateTime<Utc>,
    pub doctor_id: Uuid,
}

macro_rules! profile_event {
    ($ty:ident) => {
        impl $ty {
            /// Snapshot `doctor` under a fresh event id
            pub fn new(doctor: &Doctor) -> Self {
                Self {
                    event_id: Uuid::new_v4(),
                    occurred_on: Utc::now(),
                    doctor_id: doctor.id,
                    first_name: doctor.first_name.clone(),
                    last_name: doctor.last_name.clone(),
                    middle_name: doctor.middle_name.clone(),
                    date_of_birth: doctor.date_of_birth,
                    email: doctor.email.clone(),
                    photo_url: doctor.photo_url.clone(),
                    career_start_year: doctor.career_start_year,
                    specialization_id: doctor.specialization_id,
                    status: doctor.status,
                }
            }

            pub fn doctor(&self) -> Doctor {
                Doctor {
                    id: self.doctor_id,
                    first_name: self.first_name.clone(),
                    last_name: self.last_name.clone(),
                    middle_name: self.middle_name.clone(),
                    date_of_birth: self.date_of_birth,
                    email: self.email.clone(),
                    photo_url: self.photo_url.clone(),
                    career_start_year: self.career_start_year,
                    status: self.status,
                    specialization_id: self.specialization_id,
                }
            }
        }
    };
}

profile_event!(DoctorCreatedEvent);
profile_event!(DoctorUpdatedEvent);

macro_rules! outbox_event {
    ($ty:ty, $tag:literal) => {
        impl OutboxEvent for $ty {
            const EVENT_TYPE: &'static str = $tag;

            fn event_id(&self) -> Uuid {
                self.event_id
            }

            fn occurred_on(&self) -> DateTime<Utc> {
                self.occurred_on
            }
        }
    };
}

outbox_event!(DoctorCreatedEvent, "DoctorCreatedEvent");
outbox_event!(DoctorUpdatedEvent, "DoctorUpdatedEvent");
outbox_event!(DoctorStatusChangedEvent, "DoctorStatusChangedEvent");
outbox_event!(DoctorDeletedEvent, "DoctorDeletedEvent");

pub mod doctor_query_repo;
pub mod doctor_read_repo;
pub mod doctor_write_repo;
pub mod reference_repo;

pub use doctor_read_repo::PgDoctorProjectionStore;
pub use reference_repo::PgReferenceData;

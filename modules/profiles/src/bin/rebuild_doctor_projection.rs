//! Rebuild doctor projection tool
//!
//! Admin-only. Recomputes `read.doctors` from `write.doctors` and the current
//! reference data. Use it after restoring a backup of either store, after
//! renaming specializations, or when dead-lettered outbox records left the
//! read side behind.
//!
//! # Usage
//! ```bash
//! docker compose run --rm profiles-rs ./rebuild_doctor_projection [--dry-run]
//! ```
//!
//! Reads `DATABASE_URL` and `READ_DATABASE_URL` (defaults to `DATABASE_URL`).

use std::env;

use profiles_rs::db::init_databases;
use profiles_rs::rebuild::rebuild_doctor_projection;
use profiles_rs::repos::{PgDoctorProjectionStore, PgReferenceData};

struct Args {
    dry_run: bool,
}

impl Args {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();
        let mut dry_run = false;

        for arg in args.iter().skip(1) {
            match arg.as_str() {
                "--dry-run" => dry_run = true,
                _ => {
                    return Err(format!(
                        "Unknown argument: {}\nUsage: {} [--dry-run]",
                        arg,
                        args.first()
                            .map(|s| s.as_str())
                            .unwrap_or("rebuild_doctor_projection")
                    ))
                }
            }
        }

        Ok(Args { dry_run })
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let read_database_url = env::var("READ_DATABASE_URL").unwrap_or_else(|_| database_url.clone());

    let databases = init_databases(&database_url, &read_database_url)
        .await
        .expect("Failed to initialize databases");

    tracing::info!(dry_run = args.dry_run, "Starting doctor projection rebuild");

    let store = PgDoctorProjectionStore::new(databases.read.clone());
    let reference = PgReferenceData::new(databases.write.clone());

    match rebuild_doctor_projection(&databases.write, &store, &reference, args.dry_run).await {
        Ok(report) => {
            for doctor_id in &report.skipped {
                tracing::warn!(doctor_id = %doctor_id, "Skipped: specialization missing");
            }
            tracing::info!(
                upserted = report.upserted,
                removed = report.removed,
                skipped = report.skipped.len(),
                "Doctor projection rebuild complete"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Doctor projection rebuild failed");
            std::process::exit(1);
        }
    }
}

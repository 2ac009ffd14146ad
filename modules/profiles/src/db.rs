use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// The two stores this service talks to
///
/// `write` is authoritative and holds the outbox; `read` holds the
/// denormalized projections. Both may point at the same database.
#[derive(Clone)]
pub struct Databases {
    pub write: PgPool,
    pub read: PgPool,
}

/// Initialize a connection pool to a PostgreSQL database
///
/// Pool limits come from `DB_MAX_CONNECTIONS` (default 10),
/// `DB_MIN_CONNECTIONS` (default 0) and `DB_ACQUIRE_TIMEOUT_SECS` (default 3).
/// Tests cap these low so parallel binaries don't exhaust Postgres.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_connections = env_or("DB_MAX_CONNECTIONS", 10u32);
    let min_connections = env_or("DB_MIN_CONNECTIONS", 0u32);
    let acquire_timeout_secs = env_or("DB_ACQUIRE_TIMEOUT_SECS", 3u64);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(min_connections)
        .acquire_timeout(Duration::from_secs(acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect both pools and bring their schemas up to date
pub async fn init_databases(
    write_url: &str,
    read_url: &str,
) -> Result<Databases, sqlx::migrate::MigrateError> {
    let write = init_pool(write_url).await?;
    let read = if read_url == write_url {
        write.clone()
    } else {
        init_pool(read_url).await?
    };

    run_migrations(&write, &read).await?;

    Ok(Databases { write, read })
}

/// Apply the write-side and read-side migrations
///
/// Each migrator ignores the other's versions so both sets can share one
/// `_sqlx_migrations` table when the stores are the same database.
pub async fn run_migrations(write: &PgPool, read: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    let mut write_migrator = sqlx::migrate!("./db/migrations/write");
    write_migrator.set_ignore_missing(true);
    write_migrator.run(write).await?;

    let mut read_migrator = sqlx::migrate!("./db/migrations/read");
    read_migrator.set_ignore_missing(true);
    read_migrator.run(read).await?;

    Ok(())
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

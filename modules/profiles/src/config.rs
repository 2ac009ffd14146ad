use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusType {
    Nats,
    InMemory,
}

impl BusType {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "nats" => BusType::Nats,
            "inmemory" => BusType::InMemory,
            other => {
                tracing::warn!(bus_type = %other, "Unknown BUS_TYPE, defaulting to inmemory");
                BusType::InMemory
            }
        }
    }
}

/// Tunables of the outbox dispatcher
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Maximum records claimed per cycle
    pub batch_size: i64,
    /// Failed attempts after which a record is dead-lettered
    pub max_retry_count: i32,
    /// Fallback polling interval when no notification arrives
    pub poll_interval: Duration,
    /// Pause after a cycle-level failure (store unreachable, commit error)
    pub failure_backoff: Duration,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            batch_size: 20,
            max_retry_count: 3,
            poll_interval: Duration::from_secs(5),
            failure_backoff: Duration::from_millis(1000),
        }
    }
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub read_database_url: String,
    pub bus_type: BusType,
    pub nats_url: String,
    pub broker_exchange: String,
    pub host: String,
    pub port: u16,
    pub outbox: OutboxConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let read_database_url =
            lookup("READ_DATABASE_URL").unwrap_or_else(|| database_url.clone());

        let bus_type = BusType::parse(&lookup("BUS_TYPE").unwrap_or_else(|| "inmemory".to_string()));

        let nats_url = lookup("NATS_URL").unwrap_or_else(|| "nats://localhost:4222".to_string());

        let broker_exchange =
            lookup("BROKER_EXCHANGE").unwrap_or_else(|| "innoclinic".to_string());

        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8085)?;

        let defaults = OutboxConfig::default();
        let batch_size: i64 = parse_or(&lookup, "OUTBOX_BATCH_SIZE", defaults.batch_size)?;
        if batch_size < 1 {
            return Err("OUTBOX_BATCH_SIZE must be at least 1".to_string());
        }

        let max_retry_count: i32 =
            parse_or(&lookup, "OUTBOX_MAX_RETRY_COUNT", defaults.max_retry_count)?;
        if max_retry_count < 1 {
            return Err("OUTBOX_MAX_RETRY_COUNT must be at least 1".to_string());
        }

        let poll_interval_secs: u64 = parse_or(
            &lookup,
            "OUTBOX_POLL_INTERVAL_SECS",
            defaults.poll_interval.as_secs(),
        )?;
        let failure_backoff_ms: u64 = parse_or(
            &lookup,
            "OUTBOX_FAILURE_BACKOFF_MS",
            defaults.failure_backoff.as_millis() as u64,
        )?;

        Ok(Config {
            database_url,
            read_database_url,
            bus_type,
            nats_url,
            broker_exchange,
            host,
            port,
            outbox: OutboxConfig {
                batch_size,
                max_retry_count,
                poll_interval: Duration::from_secs(poll_interval_secs),
                failure_backoff: Duration::from_millis(failure_backoff_ms),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a valid number, got '{}'", key, raw)),
        None => Ok(default),
    }
}

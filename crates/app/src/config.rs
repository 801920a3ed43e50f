//! Worker configuration loaded from environment variables.

use std::time::Duration;

/// Outbox worker configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `DATABASE_URL` — Postgres connection string (required)
/// - `RELAY_INSTANCE_ID` — claim stamp (default: `"relay-<uuid>"`)
/// - `RELAY_BATCH_SIZE` — records claimed per cycle (default: `50`)
/// - `RELAY_POLL_INTERVAL_MS` — idle time between cycles (default: `500`)
/// - `OUTBOX_CLAIM_LEASE_SECS` — claim expiry (default: `30`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub instance_id: String,
    pub batch_size: usize,
    pub poll_interval: Duration,
    pub claim_lease: Duration,
    pub log_level: String,
}

/// `DATABASE_URL` was missing.
#[derive(Debug, thiserror::Error)]
#[error("DATABASE_URL must be set")]
pub struct MissingDatabaseUrl;

impl Config {
    /// Loads configuration from environment variables, falling back
    /// to defaults for everything except the database URL.
    pub fn from_env() -> Result<Self, MissingDatabaseUrl> {
        let database_url = std::env::var("DATABASE_URL").map_err(|_| MissingDatabaseUrl)?;
        Ok(Self {
            database_url,
            instance_id: std::env::var("RELAY_INSTANCE_ID")
                .unwrap_or_else(|_| format!("relay-{}", uuid::Uuid::new_v4())),
            batch_size: std::env::var("RELAY_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            poll_interval: Duration::from_millis(
                std::env::var("RELAY_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(500),
            ),
            claim_lease: Duration::from_secs(
                std::env::var("OUTBOX_CLAIM_LEASE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment-variable reads are process-global, so these tests
    // only cover the parsing helpers via a fully-populated env.

    #[test]
    fn from_env_requires_database_url() {
        // Only run when the variable is genuinely absent.
        if std::env::var("DATABASE_URL").is_err() {
            assert!(Config::from_env().is_err());
        }
    }
}

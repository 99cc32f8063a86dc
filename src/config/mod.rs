//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The database URL is wrapped in `SecretString` to keep
//! credentials out of logs.

use std::time::Duration;

use crate::error::{Error, Result};
use secrecy::SecretString;

pub const DEFAULT_QUEUE: &str = "tracking_events";

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub db_max_connections: u32,
    /// pgmq queue carrying persist tasks.
    pub queue: String,
    /// Maximum deliveries processed in parallel by one worker process.
    pub worker_concurrency: usize,
    /// Budget for a single enqueue call.
    pub dispatch_timeout: Duration,
    /// Budget for a whole ingestion request. Always longer than
    /// `dispatch_timeout`.
    pub request_timeout: Duration,
    pub http_addr: String,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            db_max_connections: parsed_var("DB_MAX_CONNECTIONS", 20)?,
            queue: optional_var("TRACKING_QUEUE").unwrap_or_else(|| DEFAULT_QUEUE.to_string()),
            worker_concurrency: parsed_var("WORKER_CONCURRENCY", 50)?,
            dispatch_timeout: Duration::from_millis(parsed_var("DISPATCH_TIMEOUT_MS", 500)?),
            request_timeout: Duration::from_millis(parsed_var("REQUEST_TIMEOUT_MS", 3000)?),
            http_addr: optional_var("HTTP_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            otel_endpoint: optional_var("OTEL_ENDPOINT"),
            log_level: optional_var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.worker_concurrency == 0 {
            return Err(Error::Config(
                "WORKER_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(Error::Config(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if self.dispatch_timeout >= self.request_timeout {
            return Err(Error::Config(format!(
                "DISPATCH_TIMEOUT_MS ({}) must be shorter than REQUEST_TIMEOUT_MS ({})",
                self.dispatch_timeout.as_millis(),
                self.request_timeout.as_millis()
            )));
        }
        Ok(())
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

/// Unset and empty are the same thing.
fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("{name}={raw:?} is invalid: {e}"))),
        None => Ok(default),
    }
}

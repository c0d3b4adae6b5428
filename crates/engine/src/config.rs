//! Engine configuration loaded from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::EngineError;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(EngineError::Config(format!(
                "LOG_FORMAT must be 'text' or 'json', got '{other}'"
            ))),
        }
    }
}

/// Engine configuration.
///
/// Reads from environment variables:
/// - `DATABASE_URL`: PostgreSQL connection string (required by the binary)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `METRICS_ADDR`: Prometheus listener address (default: unset, no exporter)
/// - `CATCH_UP_INTERVAL_MS`: delay between read model catch-ups (default: `1000`)
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_addr: Option<SocketAddr>,
    pub catch_up_interval: Duration,
}

impl EngineConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, EngineError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset keys. Malformed values are errors rather than silently ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EngineError> {
        let defaults = Self::default();
        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.max_connections),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format: parse(&lookup, "LOG_FORMAT")?.unwrap_or(defaults.log_format),
            metrics_addr: parse(&lookup, "METRICS_ADDR")?,
            catch_up_interval: parse::<u64>(&lookup, "CATCH_UP_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.catch_up_interval),
        })
    }

    /// Returns the database URL, or a configuration error if it is unset.
    pub fn require_database_url(&self) -> Result<&str, EngineError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| EngineError::Config("DATABASE_URL is not set".to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_addr: None,
            catch_up_interval: Duration::from_millis(1000),
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, EngineError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| EngineError::Config(format!("invalid {key} '{raw}': {e}")))
        })
        .transpose()
}

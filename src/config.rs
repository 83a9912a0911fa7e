//! Hub configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Unset or unparsable values fall back
//! to their defaults, except `LISTEN_ADDR`.

use std::net::SocketAddr;
use std::time::Duration;

/// Configuration loading failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` is set but is not a socket address.
    #[error("invalid LISTEN_ADDR `{value}`: {source}")]
    ListenAddr {
        /// Raw value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable, one event per line.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level hub configuration.
///
/// Loaded once at startup via [`HubConfig::from_env`].
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Socket address to bind the HTTP/WebSocket server to.
    pub listen_addr: SocketAddr,

    /// PostgreSQL connection string. `None` selects in-memory storage.
    pub database_url: Option<String>,

    /// Master switch for PostgreSQL storage.
    pub persistence_enabled: bool,

    /// Maximum number of database connections in the pool.
    pub database_max_connections: u32,

    /// Timeout in seconds for acquiring a database connection.
    pub database_connect_timeout_secs: u64,

    /// Seconds between monitoring ticks.
    pub monitoring_interval_secs: u64,

    /// Upper bound in seconds on a single HTTP request.
    pub request_timeout_secs: u64,

    /// Capacity of each subscriber's outbound queue.
    pub subscriber_buffer: usize,

    /// Extractions below this confidence count as unknown.
    pub extraction_min_confidence: f64,

    /// Radius used for proximity listing when the caller gives none.
    pub nearby_default_radius_km: f64,

    /// Base URL of a Nominatim endpoint; enables HTTP geocoding.
    pub nominatim_url: Option<String>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: None,
            persistence_enabled: true,
            database_max_connections: 10,
            database_connect_timeout_secs: 5,
            monitoring_interval_secs: 30,
            request_timeout_secs: 30,
            subscriber_buffer: 256,
            extraction_min_confidence: 0.5,
            nearby_default_radius_km: 50.0,
            nominatim_url: None,
            log_format: LogFormat::Pretty,
        }
    }
}

impl HubConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ListenAddr`] if `LISTEN_ADDR` is set but
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(value) => value
                .parse()
                .map_err(|source| ConfigError::ListenAddr { value, source })?,
            None => defaults.listen_addr,
        };

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let nominatim_url = lookup("NOMINATIM_URL").filter(|v| !v.trim().is_empty());

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            database_url,
            persistence_enabled: parse_bool(&lookup, "PERSISTENCE_ENABLED", defaults.persistence_enabled),
            database_max_connections: parse(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_connect_timeout_secs: parse(
                &lookup,
                "DATABASE_CONNECT_TIMEOUT_SECS",
                defaults.database_connect_timeout_secs,
            ),
            monitoring_interval_secs: parse(
                &lookup,
                "MONITORING_INTERVAL_SECS",
                defaults.monitoring_interval_secs,
            )
            .max(1),
            request_timeout_secs: parse(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )
            .max(1),
            subscriber_buffer: parse(&lookup, "SUBSCRIBER_BUFFER", defaults.subscriber_buffer).max(1),
            extraction_min_confidence: parse(
                &lookup,
                "EXTRACTION_MIN_CONFIDENCE",
                defaults.extraction_min_confidence,
            ),
            nearby_default_radius_km: parse(
                &lookup,
                "NEARBY_DEFAULT_RADIUS_KM",
                defaults.nearby_default_radius_km,
            ),
            nominatim_url,
            log_format,
        })
    }

    /// Monitoring tick period.
    #[must_use]
    pub const fn monitoring_interval(&self) -> Duration {
        Duration::from_secs(self.monitoring_interval_secs)
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Database acquire timeout.
    #[must_use]
    pub const fn database_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.database_connect_timeout_secs)
    }

    /// PostgreSQL URL when database storage is enabled.
    #[must_use]
    pub fn postgres_url(&self) -> Option<&str> {
        if self.persistence_enabled {
            self.database_url.as_deref()
        } else {
            None
        }
    }
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a variable as a boolean. Accepts `true`/`1`/`false`/`0`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::scheduling::policy::{
    DEFAULT_CONFLICT_WINDOW_MINUTES, DEFAULT_ENABLED_UNIT, MAX_CONFLICT_WINDOW_MINUTES,
};
use crate::workflows::scheduling::SchedulingPolicy;

const DEFAULT_BRIDGE_TIMEOUT_SECS: u64 = 10;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the coordinator service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scheduling: SchedulingConfig,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let enabled_unit = env::var("APP_SCHEDULING_UNIT")
            .ok()
            .map(|unit| unit.trim().to_string())
            .filter(|unit| !unit.is_empty())
            .unwrap_or_else(|| DEFAULT_ENABLED_UNIT.to_string());
        let conflict_window_minutes = match env::var("APP_CONFLICT_WINDOW_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| (1..=MAX_CONFLICT_WINDOW_MINUTES).contains(minutes))
                .ok_or(ConfigError::InvalidConflictWindow { value: raw })?,
            Err(_) => DEFAULT_CONFLICT_WINDOW_MINUTES,
        };

        let bridge_url = non_empty_var("APP_BRIDGE_URL");
        let bridge_token = non_empty_var("APP_BRIDGE_TOKEN");
        let bridge_timeout_secs = match env::var("APP_BRIDGE_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidBridgeTimeout { value: raw })?,
            Err(_) => DEFAULT_BRIDGE_TIMEOUT_SECS,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scheduling: SchedulingConfig {
                enabled_unit,
                conflict_window_minutes,
            },
            bridge: BridgeConfig {
                url: bridge_url,
                token: bridge_token,
                timeout_secs: bridge_timeout_secs,
            },
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Unit with chaplain coordination and the buffer kept around each chaplain booking.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub enabled_unit: String,
    pub conflict_window_minutes: i64,
}

impl SchedulingConfig {
    pub fn policy(&self) -> SchedulingPolicy {
        SchedulingPolicy::new(self.enabled_unit.clone(), self.conflict_window_minutes)
    }
}

/// Chaplaincy system endpoint. Without a URL invites are only logged.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidConflictWindow { value: String },
    InvalidBridgeTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidConflictWindow { value } => write!(
                f,
                "APP_CONFLICT_WINDOW_MINUTES must be between 1 and {MAX_CONFLICT_WINDOW_MINUTES} minutes, got '{value}'"
            ),
            ConfigError::InvalidBridgeTimeout { value } => write!(
                f,
                "APP_BRIDGE_TIMEOUT_SECS must be a positive number of seconds, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidConflictWindow { .. }
            | ConfigError::InvalidBridgeTimeout { .. } => None,
        }
    }
}

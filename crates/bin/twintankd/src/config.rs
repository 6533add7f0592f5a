//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `twintank.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use twintank_adapter_store_rest::RestStoreConfig;
use twintank_app::control_cycle::CycleSettings;
use twintank_domain::safety::SafetyLimits;
use twintank_domain::snapshot::TankCapacities;
use twintank_domain::threshold::Thresholds;
use twintank_domain::transfer::TransferRates;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Device store settings.
    pub store: StoreConfig,
    /// Control cycle timing and thresholds.
    pub cycle: CycleConfig,
    /// Alert boundaries.
    pub safety: SafetyLimits,
    /// Simulated flow per tick.
    pub transfer: TransferRates,
    /// Tank volumes shown on the dashboard.
    pub tanks: TankCapacities,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Dashboard auto-refresh interval.
    pub refresh_seconds: u32,
}

/// Which [`twintank_app::ports::DeviceStore`] implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote JSON collection over HTTP.
    Rest,
    /// In-process demo installation.
    #[default]
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unknown store backend {other:?}, expected \"rest\" or \"memory\""
            ))),
        }
    }
}

/// Device store configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Base URL of the REST collection, without the resource segment.
    pub base_url: String,
    /// Collection name.
    pub resource: String,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
}

/// Control cycle configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Timer period.
    pub period_ms: u64,
    /// Upper bound on a single store call made by the cycle.
    pub store_timeout_ms: u64,
    /// Percentages that produce "reached"/"dropped" history entries.
    pub thresholds: Thresholds,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `twintank.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, an
    /// override cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("twintank.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides read through `var`, so tests need not touch the
    /// process environment.
    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = var("TWINTANK_HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("TWINTANK_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Some(val) = var("TWINTANK_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("TWINTANK_STORE_URL") {
            self.store.base_url = val;
        }
        if let Some(val) = var("TWINTANK_STORE_BACKEND") {
            self.store.backend = val.parse()?;
        }
        if let Some(val) = var("TWINTANK_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.cycle.period_ms == 0 {
            return Err(ConfigError::Validation(
                "cycle period must be non-zero".to_string(),
            ));
        }
        if self.cycle.store_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "store timeout must be non-zero".to_string(),
            ));
        }
        let limits = [
            self.safety.low_capacity,
            self.safety.main_full,
            self.safety.backup_full,
            self.safety.backup_empty,
        ];
        if limits.iter().any(|limit| *limit > 100) {
            return Err(ConfigError::Validation(
                "safety limits are percentages and must not exceed 100".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle.period_ms)
    }

    /// Tunables handed to the control cycle.
    #[must_use]
    pub fn cycle_settings(&self) -> CycleSettings {
        CycleSettings {
            thresholds: self.cycle.thresholds.clone(),
            rates: self.transfer,
            limits: self.safety,
            capacities: self.tanks,
            store_timeout: Duration::from_millis(self.cycle.store_timeout_ms),
        }
    }

    /// Settings of the REST store adapter.
    #[must_use]
    pub fn rest_store(&self) -> RestStoreConfig {
        RestStoreConfig {
            base_url: self.store.base_url.clone(),
            resource: self.store.resource.clone(),
            request_timeout_ms: self.store.request_timeout_ms,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            refresh_seconds: 5,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        let rest = RestStoreConfig::default();
        Self {
            backend: StoreBackend::default(),
            base_url: rest.base_url,
            resource: rest.resource,
            request_timeout_ms: rest.request_timeout_ms,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            period_ms: 3000,
            store_timeout_ms: 2000,
            thresholds: Thresholds::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "twintankd=info,twintank=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

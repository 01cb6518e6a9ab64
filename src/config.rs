use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::matcher::{
    SearchRadii, DEFAULT_BROADCAST_RADIUS_KM, DEFAULT_MAX_RADIUS_KM,
    DEFAULT_NEARBY_DONOR_RADIUS_KM, DEFAULT_NEARBY_REQUEST_RADIUS_KM,
};

/// Application configuration
///
/// Every section has defaults, so an empty configuration boots the service
/// with in-memory storage and the log gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    /// Seen-set TTL for donor alerts; 0 disables de-duplication
    #[serde(default = "default_dedupe_ttl")]
    pub dedupe_ttl_secs: u64,
    #[serde(default = "default_dedupe_capacity")]
    pub dedupe_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            dedupe_ttl_secs: default_dedupe_ttl(),
            dedupe_capacity: default_dedupe_capacity(),
        }
    }
}

fn default_dedupe_ttl() -> u64 { 600 }
fn default_dedupe_capacity() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_nearby_donor_radius")]
    pub nearby_donor_radius_km: f64,
    #[serde(default = "default_broadcast_radius")]
    pub broadcast_radius_km: f64,
    #[serde(default = "default_nearby_request_radius")]
    pub nearby_request_radius_km: f64,
    #[serde(default = "default_max_radius")]
    pub max_radius_km: f64,
    #[serde(default = "default_lookup_timeout")]
    pub lookup_timeout_secs: u64,
    /// Move a pending request to `matched` once an alert goes out
    #[serde(default)]
    pub auto_mark_matched: bool,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            nearby_donor_radius_km: default_nearby_donor_radius(),
            broadcast_radius_km: default_broadcast_radius(),
            nearby_request_radius_km: default_nearby_request_radius(),
            max_radius_km: default_max_radius(),
            lookup_timeout_secs: default_lookup_timeout(),
            auto_mark_matched: false,
        }
    }
}

impl MatchingSettings {
    pub fn radii(&self) -> SearchRadii {
        SearchRadii {
            nearby_donor_km: self.nearby_donor_radius_km,
            broadcast_km: self.broadcast_radius_km,
            nearby_request_km: self.nearby_request_radius_km,
            max_km: self.max_radius_km,
        }
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    /// Every default radius must be one a caller could ask for explicitly
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.max_radius_km.is_finite() || self.max_radius_km <= 0.0 {
            return Err(ConfigError::Message(format!(
                "matching.max_radius_km must be positive, got {}",
                self.max_radius_km
            )));
        }

        let defaults = [
            ("nearby_donor_radius_km", self.nearby_donor_radius_km),
            ("broadcast_radius_km", self.broadcast_radius_km),
            ("nearby_request_radius_km", self.nearby_request_radius_km),
        ];

        for (key, radius) in defaults {
            if !radius.is_finite() || radius <= 0.0 || radius > self.max_radius_km {
                return Err(ConfigError::Message(format!(
                    "matching.{} = {} must be positive and at most matching.max_radius_km ({})",
                    key, radius, self.max_radius_km
                )));
            }
        }

        Ok(())
    }
}

fn default_nearby_donor_radius() -> f64 { DEFAULT_NEARBY_DONOR_RADIUS_KM }
fn default_broadcast_radius() -> f64 { DEFAULT_BROADCAST_RADIUS_KM }
fn default_nearby_request_radius() -> f64 { DEFAULT_NEARBY_REQUEST_RADIUS_KM }
fn default_max_radius() -> f64 { DEFAULT_MAX_RADIUS_KM }
fn default_lookup_timeout() -> u64 { 5 }

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    #[default]
    Log,
    Webhook,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub gateway: GatewayKind,
    pub webhook_url: Option<String>,
    pub webhook_token: Option<String>,
    #[serde(default = "default_gateway_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::Log,
            webhook_url: None,
            webhook_token: None,
            timeout_secs: default_gateway_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_gateway_timeout() -> u64 { 10 }
fn default_queue_capacity() -> usize { 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, config/local.toml)
    /// 3. Environment variables (prefixed with RAKHT__)
    /// 4. DATABASE_URL and REDIS_URL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., RAKHT__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }

    /// Deserialize the merged sources and reject inconsistent values
    fn finish(settings: Config) -> Result<Self, ConfigError> {
        let settings: Settings = substitute_env_vars(settings)?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matching.validate()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        Self::finish(settings)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("RAKHT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional DATABASE_URL / REDIS_URL variables on top of the loaded config
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", url)?;
    }
    if let Ok(url) = env::var("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", url)?;
    }

    builder.build()
}

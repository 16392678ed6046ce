use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rate: RateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RedisConfig {
    /// Absent URL means the in-process cache is used instead.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub access_key: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    #[serde(default = "default_transport_retries")]
    pub max_transport_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Live flight data goes stale in minutes.
    #[serde(default = "default_current_ttl_seconds")]
    pub current_ttl_seconds: u64,
    /// Future schedules barely move; hold them for hours.
    #[serde(default = "default_future_ttl_seconds")]
    pub future_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            current_ttl_seconds: default_current_ttl_seconds(),
            future_ttl_seconds: default_future_ttl_seconds(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateConfig {
    /// Minimum spacing between current-endpoint calls.
    #[serde(default = "default_current_interval_ms")]
    pub current_interval_ms: u64,
    /// Cool-down before the minute-limited future-schedule endpoint.
    #[serde(default = "default_future_cooldown_seconds")]
    pub future_cooldown_seconds: u64,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            current_interval_ms: default_current_interval_ms(),
            future_cooldown_seconds: default_future_cooldown_seconds(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_rate_limit_retries() -> u32 {
    3
}

fn default_transport_retries() -> u32 {
    2
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_backoff_cap_ms() -> u64 {
    10_000
}

fn default_current_ttl_seconds() -> u64 {
    300
}

fn default_future_ttl_seconds() -> u64 {
    21_600
}

fn default_current_interval_ms() -> u64 {
    600
}

fn default_future_cooldown_seconds() -> u64 {
    60
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file (optional)
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of VOLARE)
            // Eg. `VOLARE__PROVIDER__ACCESS_KEY=...` sets provider.access_key
            .add_source(config::Environment::with_prefix("VOLARE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

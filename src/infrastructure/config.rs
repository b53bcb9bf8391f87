//! Configuration management for the viewer
//!
//! Loads configuration from config.toml at startup.
//! All tunables live here to avoid hardcoded constants.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Viewer configuration
///
/// Loaded from config.toml at startup. A missing file means defaults;
/// a malformed file is an error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Bybit REST settings
    #[serde(default)]
    pub bybit: BybitConfig,

    /// Bithumb REST settings
    #[serde(default)]
    pub bithumb: BithumbConfig,

    /// Currency exchange-rate API settings
    #[serde(default)]
    pub rates: RatesConfig,

    /// View pipeline settings
    #[serde(default)]
    pub view: ViewConfig,
}

/// Bybit REST configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BybitConfig {
    /// Base URL of the v5 market API
    #[serde(default = "default_bybit_base_url")]
    pub base_url: String,

    /// Ticker refresh interval in milliseconds
    #[serde(default = "default_bybit_refresh_ms")]
    pub refresh_ms: u64,
}

/// Bithumb REST configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BithumbConfig {
    /// Base URL of the public ticker API
    #[serde(default = "default_bithumb_base_url")]
    pub base_url: String,

    /// Ticker refresh interval in milliseconds
    ///
    /// Slower than Bybit: one cycle hits three sub-market endpoints.
    #[serde(default = "default_bithumb_refresh_ms")]
    pub refresh_ms: u64,
}

/// Exchange-rate API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatesConfig {
    /// Base URL of the v6 API
    #[serde(default = "default_rates_base_url")]
    pub base_url: String,

    /// API key; empty disables the rates feature
    #[serde(default)]
    pub api_key: String,

    /// Base currency the rate table is quoted against
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
}

/// View pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewConfig {
    /// How long a price-change highlight stays active, in milliseconds
    #[serde(default = "default_price_effect_ms")]
    pub price_effect_ms: u64,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: default_bybit_base_url(),
            refresh_ms: default_bybit_refresh_ms(),
        }
    }
}

impl Default for BithumbConfig {
    fn default() -> Self {
        Self {
            base_url: default_bithumb_base_url(),
            refresh_ms: default_bithumb_refresh_ms(),
        }
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: default_rates_base_url(),
            api_key: String::new(),
            base_currency: default_base_currency(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            price_effect_ms: default_price_effect_ms(),
        }
    }
}

fn default_bybit_base_url() -> String {
    "https://api.bybit.com/v5/market".to_string()
}

fn default_bybit_refresh_ms() -> u64 {
    1_000
}

fn default_bithumb_base_url() -> String {
    "https://api.bithumb.com/public/ticker".to_string()
}

fn default_bithumb_refresh_ms() -> u64 {
    3_000
}

fn default_rates_base_url() -> String {
    "https://v6.exchangerate-api.com/v6".to_string()
}

fn default_base_currency() -> String {
    "USD".to_string()
}

fn default_price_effect_ms() -> u64 {
    200
}

impl Config {
    /// Load configuration from config.toml file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// # Errors
    /// Returns error if file exists but cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents)
                    .map_err(|e| ConfigError::ParseError(e.to_string()))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(ConfigError::IoError(e)),
        }
    }

    pub fn bybit_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.bybit.refresh_ms)
    }

    pub fn bithumb_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.bithumb.refresh_ms)
    }

    pub fn price_effect_duration(&self) -> Duration {
        Duration::from_millis(self.view.price_effect_ms)
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading file
    IoError(std::io::Error),
    /// Parse error (invalid TOML)
    ParseError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "Failed to read config file: {}", e),
            ConfigError::ParseError(e) => write!(f, "Failed to parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::ParseError(_) => None,
        }
    }
}

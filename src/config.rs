//! Configuration
//!
//! clap argument groups with environment fallbacks. Binaries flatten these
//! into their own parser and call `dotenvy::dotenv()` first.

use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::catalog::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Default catalog search endpoint.
pub const DEFAULT_CATALOG_URL: &str = "https://stageapi.monkcommerce.app/task/products/search";

/// Quiet period before a search text change triggers a reload.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Remote catalog settings
#[derive(Debug, Clone, Args)]
pub struct CatalogConfig {
    /// Catalog search endpoint
    #[arg(long, env = "CATALOG_API_URL", default_value = DEFAULT_CATALOG_URL)]
    pub catalog_url: String,

    /// Catalog API key
    #[arg(long, env = "CATALOG_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "CATALOG_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

/// Picker session settings
#[derive(Debug, Clone, Copy, Args)]
pub struct PickerConfig {
    /// Products per catalog page (1-100)
    #[arg(long, env = "PICKER_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Search debounce quiet period in milliseconds
    #[arg(long, env = "PICKER_DEBOUNCE_MS", default_value_t = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,
}

impl PickerConfig {
    /// Page size clamped to what the catalog serves.
    pub fn page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// Debounce quiet period.
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

/// Log output format
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human readable single-line output
    #[default]
    Compact,

    /// Structured JSON output
    Json,
}

/// Logging settings
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

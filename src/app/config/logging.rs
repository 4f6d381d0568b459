//! Structured logging setup.

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

/// Logging configuration: level feeds an `EnvFilter` (with `RUST_LOG` taking
/// precedence when set); format selects plain human-readable output or
/// newline-delimited JSON for log aggregation.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

impl LoggingConfig {
    /// Initializes the global `tracing` subscriber. Idempotent-safe to call
    /// once at process start; a second call is a programming error upstream,
    /// not something this guards against.
    pub fn init(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.clone()));

        if self.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .init();
        } else {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
}

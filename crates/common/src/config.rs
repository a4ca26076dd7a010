//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default level for every target not named in `rust_log`
    pub log_level: String,
    pub rust_log: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let config = Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "kata=debug".to_string()),
        };

        tracing::debug!(log_level = %config.log_level, "Configuration loaded");

        Ok(config)
    }

    /// Filter directives combining the default level with per-target overrides
    pub fn log_filter(&self) -> String {
        match self.rust_log.trim() {
            "" => self.log_level.clone(),
            targets => format!("{},{}", self.log_level, targets),
        }
    }
}

//! Application configuration loaded from environment variables.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Store Credentials ===
    /// Deta project key ("<project_id>_<secret>"). Authenticates every
    /// request to the store.
    pub deta_project_key: String,

    /// Deta Base API root.
    #[serde(default = "default_base_url")]
    pub deta_base_url: String,

    // === Collections ===
    /// Collection holding records and sync payloads.
    #[serde(default = "default_records_collection")]
    pub records_collection: String,

    /// Collection holding auth tokens (written by an external component).
    #[serde(default = "default_tokens_collection")]
    pub tokens_collection: String,

    // === Reaper ===
    /// Token lifetime in hours; tokens expired longer than this are reaped.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    // === Server Configuration ===
    /// HTTP server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-request timeout for store calls, in milliseconds.
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,
}

fn default_base_url() -> String {
    "https://database.deta.sh/v1".to_string()
}

fn default_records_collection() -> String {
    "medical-records".to_string()
}

fn default_tokens_collection() -> String {
    "tokens".to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_port() -> u16 {
    8080
}

fn default_http_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        if self.deta_project_key.is_empty() {
            return Err("DETA_PROJECT_KEY is required".to_string());
        }

        if self.project_id().is_none() {
            return Err(
                "DETA_PROJECT_KEY must look like <project_id>_<secret>".to_string(),
            );
        }

        if self.token_ttl_hours == 0 {
            return Err("TOKEN_TTL_HOURS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Project id embedded in the project key (prefix before the first `_`).
    pub fn project_id(&self) -> Option<&str> {
        match self.deta_project_key.split_once('_') {
            Some((id, _)) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    /// Token lifetime as a [`Duration`].
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours * 3600)
    }
}

//! Configuration loading
//!
//! Sources, later ones winning:
//! - built-in defaults
//! - `config/default` and `config/local` files (any format `config` reads)
//! - environment variables prefixed with `ALUGUX__`, e.g. `ALUGUX__REMOTE__URL`

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{AppError, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub app: AppSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: String,

    /// Public (anon) API key sent as `apikey` on every request
    #[serde(default)]
    pub anon_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppSettings {
    /// Public URL of the application, used for password-reset redirects
    #[serde(default = "default_site_url")]
    pub site_url: String,

    /// Upper bound used when filtering a month's records
    #[serde(default)]
    pub month_boundary: MonthBoundary,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// How the last day of a selected month is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthBoundary {
    /// Always `<year>-<month>-31`, whatever the month's length. Only safe on
    /// backends that compare dates as text; PostgreSQL rejects `2024-02-31`.
    Fixed,
    /// The real last day of the month.
    #[default]
    Calendar,
}

fn default_timeout() -> u64 { 30 }
fn default_site_url() -> String { "http://localhost:8080".to_string() }
fn default_log_level() -> String { "info".to_string() }

impl RemoteConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            site_url: default_site_url(),
            month_boundary: MonthBoundary::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, config files and the environment
    pub fn load() -> Result<Self> {
        // A missing .env is fine; real environment variables still apply.
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("ALUGUX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Whether enough is configured to talk to the hosted backend.
    pub fn has_remote(&self) -> bool {
        !self.remote.url.is_empty() && !self.remote.anon_key.is_empty()
    }

    /// Fail early when the hosted backend is required but not configured.
    pub fn require_remote(&self) -> Result<()> {
        if self.has_remote() {
            Ok(())
        } else {
            Err(AppError::Configuration {
                message: "ALUGUX__REMOTE__URL and ALUGUX__REMOTE__ANON_KEY must be set".to_string(),
            })
        }
    }

    /// Redirect target for password-reset emails
    pub fn reset_redirect_url(&self) -> String {
        format!("{}/auth?reset=true", self.app.site_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.remote.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.app.month_boundary, MonthBoundary::Calendar);
        assert!(!config.has_remote());
        assert!(config.require_remote().is_err());
    }

    #[test]
    fn test_reset_redirect_url() {
        let mut config = AppConfig::default();
        config.app.site_url = "https://alugux.app/".to_string();
        assert_eq!(config.reset_redirect_url(), "https://alugux.app/auth?reset=true");
    }

    #[test]
    fn test_month_boundary_from_str() {
        let boundary: MonthBoundary = serde_json::from_str("\"calendar\"").unwrap();
        assert_eq!(boundary, MonthBoundary::Calendar);
    }
}

//! Configuration infrastructure
//!
//! Contains configuration loading and management for the archiver.
//!
//! Configuration is organized into three sections:
//! 1. Portal endpoints and request identity (`portal`)
//! 2. Archiving behaviour (`archiving`)
//! 3. Logging (`logging`)
//!
//! Every section is `#[serde(default)]`, so a config file only needs the
//! fields it wants to override.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::network_observer::IdentifierPolicy;

/// Directory name under the user config / data dirs.
pub const APP_DIR_NAME: &str = "vdab-job-archiver";

pub mod defaults {
    pub const LIST_ENDPOINT: &str = "https://www.vdab.be/rest/vindeenjob/v4/sollicitaties/page";
    pub const ARCHIVE_ENDPOINT: &str = "https://www.vdab.be/api/vindeenjob/prive/sollicitaties";
    pub const PROBE_ENDPOINT: &str = "https://www.vdab.be/rest/vindeenjob/v4/bewaardeVacatures";
    pub const REFERER: &str =
        "https://www.vdab.be/vindeenjob/prive/bewaarde-vacatures-en-sollicitaties";
    pub const MONITOR_KEY: &str = "b277002f-e1fa-4fc5-868a-fdab633c3851";
    pub const PAGE_SIZE: u32 = 150;
    pub const USER_AGENT: &str = concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36"
    );
    pub const ITEM_DELAY_MS: u64 = 100;
    pub const DEFAULT_CUTOFF_MONTHS: u32 = 1;
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub portal: PortalConfig,
    pub archiving: ArchivingConfig,
    pub logging: LoggingConfig,
}

/// Endpoints and the browser identity requests are sent with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Paged listing of the user's applications
    pub list_endpoint: String,
    /// Base of the per-application archive URL (`{base}/{id}/archiveer`)
    pub archive_endpoint: String,
    /// Lightweight call used to validate the session identifier
    pub probe_endpoint: String,
    pub referer: String,
    /// Value of the `vej-key-monitor` header the portal front end sends
    pub monitor_key: String,
    pub accept_language: String,
    pub user_agent: String,
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Results requested per listing page
    pub page_size: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            list_endpoint: defaults::LIST_ENDPOINT.to_string(),
            archive_endpoint: defaults::ARCHIVE_ENDPOINT.to_string(),
            probe_endpoint: defaults::PROBE_ENDPOINT.to_string(),
            referer: defaults::REFERER.to_string(),
            monitor_key: defaults::MONITOR_KEY.to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            user_agent: defaults::USER_AGENT.to_string(),
            request_timeout_seconds: 30,
            page_size: defaults::PAGE_SIZE,
        }
    }
}

impl PortalConfig {
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Archiving behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchivingConfig {
    /// Pause after every archive call in milliseconds
    pub item_delay_ms: u64,
    /// Cutoff used when neither the command line nor the stored preference has one
    pub default_cutoff_months: u32,
    /// What the network observer may do once an identifier passed validation
    pub identifier_policy: IdentifierPolicy,
    /// Capacity of the UI event broadcast channel
    pub event_buffer_size: usize,
}

impl Default for ArchivingConfig {
    fn default() -> Self {
        Self {
            item_delay_ms: defaults::ITEM_DELAY_MS,
            default_cutoff_months: defaults::DEFAULT_CUTOFF_MONTHS,
            identifier_policy: IdentifierPolicy::default(),
            event_buffer_size: 256,
        }
    }
}

impl ArchivingConfig {
    pub const fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_ms)
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs (file output only)
    pub json_format: bool,

    /// Enable console output (stderr)
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let mut module_filters = HashMap::new();
        module_filters.insert("reqwest".to_string(), "warn".to_string());
        module_filters.insert("hyper".to_string(), "warn".to_string());
        module_filters.insert("html5ever".to_string(), "warn".to_string());

        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            module_filters,
        }
    }
}

/// Loads and saves [`AppConfig`] as JSON
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(APP_DIR_NAME);

        Ok(config_dir)
    }

    /// Configuration manager for the default location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Preferences live in the same directory as the configuration file
    pub fn preferences_path(&self) -> PathBuf {
        self.config_path.with_file_name("preferences.json")
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .context("Failed to read configuration file")?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok(config)
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file could not be parsed: {}", parse_error);
                warn!("⚠️  Resetting to default configuration");

                // Keep the broken file around for inspection
                let backup_path = self.config_path.with_extension("json.corrupted");
                if let Err(e) = fs::copy(&self.config_path, &backup_path).await {
                    warn!("Failed to create backup of corrupted config: {}", e);
                }

                let default_config = AppConfig::default();
                self.save_config(&default_config).await?;
                Ok(default_config)
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create config directory: {parent:?}"))?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("💾 Configuration saved to: {:?}", self.config_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_portal_contract() {
        let config = AppConfig::default();
        assert_eq!(config.portal.page_size, 150);
        assert_eq!(config.archiving.item_delay(), Duration::from_millis(100));
        assert_eq!(config.archiving.default_cutoff_months, 1);
        assert_eq!(config.archiving.identifier_policy, IdentifierPolicy::PinAfterValidation);
        assert!(config.logging.console_output);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "archiving": { "item_delay_ms": 5 } }"#).unwrap();
        assert_eq!(config.archiving.item_delay_ms, 5);
        assert_eq!(config.archiving.default_cutoff_months, 1);
        assert_eq!(config.portal.list_endpoint, defaults::LIST_ENDPOINT);
    }

    #[tokio::test]
    async fn test_missing_file_is_created_with_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));
        let config = manager.load_config().await.unwrap();
        assert_eq!(config.portal.page_size, 150);
        assert!(manager.config_path().exists());
    }

    #[tokio::test]
    async fn test_corrupted_file_is_backed_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let manager = ConfigManager::with_path(&path);
        let config = manager.load_config().await.unwrap();

        assert_eq!(config.archiving.item_delay_ms, defaults::ITEM_DELAY_MS);
        assert!(dir.path().join("config.json.corrupted").exists());
    }

    #[tokio::test]
    async fn test_round_trip_through_disk() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));
        let mut config = AppConfig::default();
        config.archiving.identifier_policy = IdentifierPolicy::OverwriteOnSight;
        manager.save_config(&config).await.unwrap();

        let loaded = manager.load_config().await.unwrap();
        assert_eq!(loaded.archiving.identifier_policy, IdentifierPolicy::OverwriteOnSight);
    }
}

//! The one user-facing setting that outlives a run: the age cutoff.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use crate::infrastructure::config::ConfigManager;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Archive applications older than this many months
    #[serde(
        default,
        rename = "olderThan",
        deserialize_with = "months_from_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub older_than_months: Option<u32>,
}

/// Older stores kept the select box value, i.e. a string such as `"3"`.
fn months_from_text_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Number(u32),
        Text(String),
    }

    Ok(match Option::<Wire>::deserialize(deserializer)? {
        Some(Wire::Number(months)) => Some(months),
        Some(Wire::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// JSON-file backed preference store next to the configuration file.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn beside(config: &ConfigManager) -> Self {
        Self::with_path(config.preferences_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored preferences; a missing or unreadable file yields defaults.
    pub async fn load(&self) -> UserPreferences {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return UserPreferences::default(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("⚠️ Ignoring unreadable preferences {:?}: {}", self.path, e);
            UserPreferences::default()
        })
    }

    pub async fn save(&self, preferences: &UserPreferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create preference directory {parent:?}"))?;
        }
        let content = serde_json::to_string_pretty(preferences)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write preferences {:?}", self.path))?;
        Ok(())
    }

    /// Writes the cutoff only when it differs from the stored one.
    /// Returns whether anything changed.
    pub async fn set_older_than(&self, months: u32) -> Result<bool> {
        let mut preferences = self.load().await;
        if preferences.older_than_months == Some(months) {
            return Ok(false);
        }
        preferences.older_than_months = Some(months);
        self.save(&preferences).await?;
        info!("💾 Saved cutoff preference: {} months", months);
        Ok(true)
    }
}

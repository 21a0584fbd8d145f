//! Application settings, stored as JSON under the user's home directory.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font_size")]
    pub editor_font_size: f32,
    #[serde(default)]
    pub show_system_schemas: bool,
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_font_size() -> f32 {
    13.0
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            editor_font_size: default_font_size(),
            show_system_schemas: false,
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".dbdeck").join("settings.json"))
}

/// Load settings from the default location. A missing or unreadable file
/// falls back to defaults.
pub async fn load_settings() -> AppSettings {
    match settings_path() {
        Some(path) => load_settings_from(&path).await,
        None => AppSettings::default(),
    }
}

/// Load settings from a specific file.
pub async fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }

    let content = match async_fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("Failed to read settings file: {}", e);
            return AppSettings::default();
        }
    };

    if content.trim().is_empty() {
        return AppSettings::default();
    }

    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::warn!("Failed to parse settings file: {}", e);
        AppSettings::default()
    })
}

/// Save settings to the default location.
pub async fn save_settings(settings: &AppSettings) -> Result<()> {
    let path =
        settings_path().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    save_settings_to(&path, settings).await
}

/// Save settings to a specific file, creating parent directories as needed.
pub async fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    async_fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[async_std::test]
    async fn settings_round_trip_through_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = AppSettings {
            theme: "light".to_string(),
            editor_font_size: 15.0,
            show_system_schemas: true,
        };
        save_settings_to(&path, &settings).await.unwrap();

        let loaded = load_settings_from(&path).await;
        assert_eq!(loaded, settings);
    }

    #[async_std::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings_from(&dir.path().join("absent.json")).await;
        assert_eq!(loaded, AppSettings::default());
    }

    #[async_std::test]
    async fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        async_fs::write(&path, "not json {").await.unwrap();

        let loaded = load_settings_from(&path).await;
        assert_eq!(loaded, AppSettings::default());
    }

    #[async_std::test]
    async fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        async_fs::write(&path, r#"{"theme":"solarized"}"#)
            .await
            .unwrap();

        let loaded = load_settings_from(&path).await;
        assert_eq!(loaded.theme, "solarized");
        assert_eq!(loaded.editor_font_size, default_font_size());
        assert!(!loaded.show_system_schemas);
    }
}

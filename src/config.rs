use crate::{error::Result, EditorError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default = "default_language_id")]
    pub default_language_id: String,
    #[serde(default = "default_identifier")]
    pub default_identifier: String,
    #[serde(default = "default_section_heading_styles")]
    pub section_heading_styles: Vec<String>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

fn default_language_id() -> String {
    "en".to_string()
}

fn default_identifier() -> String {
    "default".to_string()
}

pub fn default_section_heading_styles() -> Vec<String> {
    ["s", "s1", "s2", "s3", "s4", "ms", "ms1", "ms2", "ms3"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: None,
            default_language_id: default_language_id(),
            default_identifier: default_identifier(),
            section_heading_styles: default_section_heading_styles(),
            log_filter: None,
        }
    }
}

impl Config {
    /// Resolves the database file, falling back to `editor.db` in the
    /// platform data directory.
    pub fn resolve_database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(PathBuf::from(path));
        }

        let mut path = dirs::data_dir()
            .ok_or_else(|| EditorError::Config("Failed to get data directory".to_string()))?;
        path.push("usx-editor");
        fs::create_dir_all(&path)?;
        path.push("editor.db");
        Ok(path)
    }
}

pub fn get_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir()
        .ok_or_else(|| EditorError::Config("Failed to get config directory".to_string()))?;

    path.push("usx-editor");
    fs::create_dir_all(&path)?;

    path.push("config.json");
    Ok(path)
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

/// Loads the config at `path`, writing the defaults there first if the file
/// does not exist yet. Files written by older versions are backfilled.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        let default_config = Config::default();
        save_config_to(&default_config, path)?;
        return Ok(default_config);
    }

    let content = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| EditorError::Config(format!("Failed to parse config: {}", e)))?;
    let mut config: Config = serde_json::from_value(value.clone())
        .map_err(|e| EditorError::Config(format!("Failed to parse config: {}", e)))?;

    let mut changed = false;
    if config.section_heading_styles.is_empty() {
        config.section_heading_styles = default_section_heading_styles();
        changed = true;
    }

    let needs_backfill = value
        .as_object()
        .map(|obj| {
            !obj.contains_key("section_heading_styles") || !obj.contains_key("default_identifier")
        })
        .unwrap_or(false);
    if needs_backfill || changed {
        save_config_to(&config, path)?;
    }

    Ok(config)
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| EditorError::Config(format!("Failed to serialize config: {}", e)))?;

    fs::write(path, content)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");

        let config = load_config_from(&path).unwrap();

        assert_eq!(config, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn test_old_config_is_backfilled() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "default_language_id": "fr" }"#).unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.default_language_id, "fr");
        assert_eq!(config.section_heading_styles, default_section_heading_styles());

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("section_heading_styles"));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.json");
        let config = Config {
            database_path: Some("/tmp/editor.db".to_string()),
            section_heading_styles: vec!["s".to_string()],
            ..Config::default()
        };

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded, config);
        assert_eq!(
            loaded.resolve_database_path().unwrap(),
            PathBuf::from("/tmp/editor.db")
        );
    }
}

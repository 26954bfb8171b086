//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Folder used when neither the command line nor the config names a root
pub const DEFAULT_CONTENT_DIR: &str = "content";

const MAX_RECENT_ROOTS: usize = 10;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Vault root served by default
    pub content_root: Option<PathBuf>,
    /// Recently served roots, most recent first
    pub recent_roots: Vec<PathBuf>,
    /// File tree settings
    pub tree: TreeConfig,
    /// Log level filter (error, warn, info, debug, trace)
    pub log_level: String,
}

/// File tree settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Sort listings by name; otherwise directory order is used
    pub sort_entries: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content_root: None,
            recent_roots: Vec::new(),
            tree: TreeConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { sort_entries: true }
    }
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "mdvault", "MdVault")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from the platform config directory
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from a file, falling back to defaults when it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to the platform config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Pick the vault root: explicit override, then config, then `./content`
    pub fn resolve_root(&self, cli_root: Option<PathBuf>) -> PathBuf {
        cli_root
            .or_else(|| self.content_root.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_DIR))
    }

    /// Add a root to recent roots
    pub fn add_recent_root(&mut self, path: PathBuf) {
        self.recent_roots.retain(|p| p != &path);
        self.recent_roots.insert(0, path);
        self.recent_roots.truncate(MAX_RECENT_ROOTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.content_root.is_none());
        assert!(config.tree.sort_entries);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        let mut config = AppConfig::default();
        config.content_root = Some(PathBuf::from("/srv/notes"));
        config.tree.sort_entries = false;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.content_root, Some(PathBuf::from("/srv/notes")));
        assert!(!loaded.tree.sort_entries);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.tree.sort_entries);
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_root_precedence() {
        let mut config = AppConfig::default();
        assert_eq!(config.resolve_root(None), PathBuf::from("content"));

        config.content_root = Some(PathBuf::from("/srv/notes"));
        assert_eq!(config.resolve_root(None), PathBuf::from("/srv/notes"));
        assert_eq!(
            config.resolve_root(Some(PathBuf::from("/tmp/other"))),
            PathBuf::from("/tmp/other")
        );
    }

    #[test]
    fn test_recent_roots_dedup_and_cap() {
        let mut config = AppConfig::default();
        for i in 0..12 {
            config.add_recent_root(PathBuf::from(format!("/v/{i}")));
        }
        config.add_recent_root(PathBuf::from("/v/5"));

        assert_eq!(config.recent_roots.len(), 10);
        assert_eq!(config.recent_roots[0], PathBuf::from("/v/5"));
        assert_eq!(
            config.recent_roots.iter().filter(|p| **p == PathBuf::from("/v/5")).count(),
            1
        );
    }
}

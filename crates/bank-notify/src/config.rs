//! Configuration for the notification listener.

use crate::registry::default_watched_apps;
use crate::{NotifyError, Result, WatchedApp, WatchedAppRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the bank notification listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Whether notifications are forwarded at all
    pub enabled: bool,

    /// This app's package id, looked up in the enabled-listeners setting
    pub own_package: String,

    /// Apps whose notifications are forwarded
    pub watched_apps: Vec<WatchedApp>,

    /// Log notification title/body at debug level
    pub log_contents: bool,

    /// Capacity of the record channel used by the listener service loop
    pub channel_capacity: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            own_package: "com.appfinancas".to_string(),
            watched_apps: default_watched_apps(),
            log_contents: false, // Bank notifications carry balances
            channel_capacity: 100,
        }
    }
}

impl ListenerConfig {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NotifyError::Config(format!("Failed to read config: {}", e)))?;

        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults if absent.
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(&Self::default_path())
    }

    /// Load from `path`, falling back to defaults if the file does not exist.
    pub fn load_or_default_from(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    /// Save configuration to a specific file, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content = serde_json::to_string_pretty(self)?;

        std::fs::write(path, content)
            .map_err(|e| NotifyError::Config(format!("Failed to save config: {}", e)))?;

        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bank-notify")
            .join("listener_config.json")
    }

    /// Reject configurations the listener cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.own_package.trim().is_empty() {
            return Err(NotifyError::Config("own_package must not be empty".into()));
        }
        if self.channel_capacity == 0 {
            return Err(NotifyError::Config("channel_capacity must be positive".into()));
        }
        self.registry().map(|_| ())
    }

    /// Build the watched-app registry.
    pub fn registry(&self) -> Result<WatchedAppRegistry> {
        WatchedAppRegistry::new(self.watched_apps.clone())
    }

    /// Add or rename a watched app.
    pub fn watch_app(&mut self, package_id: impl Into<String>, display_name: impl Into<String>) {
        let app = WatchedApp::new(package_id, display_name);
        match self
            .watched_apps
            .iter_mut()
            .find(|a| a.package_id == app.package_id)
        {
            Some(existing) => existing.display_name = app.display_name,
            None => self.watched_apps.push(app),
        }
    }

    /// Stop watching an app. Returns whether it was watched.
    pub fn unwatch_app(&mut self, package_id: &str) -> bool {
        let before = self.watched_apps.len();
        self.watched_apps.retain(|a| a.package_id != package_id);
        self.watched_apps.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ListenerConfig::default();
        assert!(config.enabled);
        assert!(!config.log_contents);
        assert_eq!(config.own_package, "com.appfinancas");
        assert_eq!(config.watched_apps.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_watch_management() {
        let mut config = ListenerConfig::default();

        config.watch_app("com.itau", "Itaú");
        assert_eq!(config.registry().unwrap().len(), 4);

        config.watch_app("com.itau", "Banco Itaú");
        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.app_name("com.itau"), "Banco Itaú");

        assert!(config.unwatch_app("com.itau"));
        assert!(!config.unwatch_app("com.itau"));
        assert_eq!(config.watched_apps.len(), 3);
    }

    #[test]
    fn test_validation() {
        let mut config = ListenerConfig::default();
        config.own_package = String::new();
        assert!(matches!(config.validate(), Err(NotifyError::Config(_))));

        let mut config = ListenerConfig::default();
        config
            .watched_apps
            .push(WatchedApp::new("com.nu.production", "Nu"));
        assert!(matches!(config.validate(), Err(NotifyError::Registry(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listener_config.json");

        let mut config = ListenerConfig::default();
        config.log_contents = true;
        config.save_to(&path).unwrap();

        let loaded = ListenerConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listener_config.json");
        std::fs::write(&path, r#"{ "enabled": false }"#).unwrap();

        let loaded = ListenerConfig::load(&path).unwrap();
        assert!(!loaded.enabled);
        assert_eq!(loaded.watched_apps, default_watched_apps());
    }

    #[test]
    fn test_load_or_default_from() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listener_config.json");

        let fallback = ListenerConfig::load_or_default_from(&path).unwrap();
        assert_eq!(fallback, ListenerConfig::default());

        let mut config = ListenerConfig::default();
        config.watch_app("com.itau", "Itaú");
        config.save_to(&path).unwrap();

        let loaded = ListenerConfig::load_or_default_from(&path).unwrap();
        assert_eq!(loaded.watched_apps.len(), 4);
    }

    #[test]
    fn test_load_or_default_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listener_config.json");
        std::fs::write(&path, r#"{ "channel_capacity": 0 }"#).unwrap();

        let result = ListenerConfig::load_or_default_from(&path);
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }

    #[test]
    fn test_save_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank-notify").join("nested").join("listener_config.json");

        ListenerConfig::default().save_to(&path).unwrap();
        assert!(path.exists());
        assert_eq!(ListenerConfig::load(&path).unwrap(), ListenerConfig::default());
    }

    #[test]
    fn test_default_path_layout() {
        let path = ListenerConfig::default_path();
        assert!(path.ends_with("bank-notify/listener_config.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = ListenerConfig::load(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(NotifyError::Config(_))));
    }
}

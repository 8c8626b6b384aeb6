//! Registry of the banking/payment apps whose notifications are forwarded.

use crate::{NotifyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A watched application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchedApp {
    /// Android package name, matched exactly
    pub package_id: String,

    /// Name reported to the host as `appName`
    pub display_name: String,
}

impl WatchedApp {
    pub fn new(package_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// Built-in watch list.
pub fn default_watched_apps() -> Vec<WatchedApp> {
    vec![
        WatchedApp::new("com.nu.production", "Nubank"),
        WatchedApp::new("br.com.bb.android", "Banco do Brasil"),
        WatchedApp::new("com.google.android.apps.walletnfcrel", "Google Pay"),
    ]
}

/// Immutable lookup table over the watched apps.
///
/// Package identifiers are unique and non-empty; lookups are exact and
/// case-sensitive.
#[derive(Debug, Clone)]
pub struct WatchedAppRegistry {
    apps: Vec<WatchedApp>,
    index: HashMap<String, usize>,
}

impl WatchedAppRegistry {
    /// Build a registry, rejecting empty or duplicate package identifiers.
    pub fn new(apps: Vec<WatchedApp>) -> Result<Self> {
        let mut index = HashMap::with_capacity(apps.len());

        for (i, app) in apps.iter().enumerate() {
            if app.package_id.trim().is_empty() {
                return Err(NotifyError::Registry(format!(
                    "empty package id at entry {}",
                    i
                )));
            }
            if index.insert(app.package_id.clone(), i).is_some() {
                return Err(NotifyError::Registry(format!(
                    "duplicate package id: {}",
                    app.package_id
                )));
            }
        }

        Ok(Self { apps, index })
    }

    /// Find the entry for a package.
    pub fn lookup(&self, package_id: &str) -> Option<&WatchedApp> {
        self.index.get(package_id).map(|&i| &self.apps[i])
    }

    pub fn contains(&self, package_id: &str) -> bool {
        self.index.contains_key(package_id)
    }

    /// Display name for a package, falling back to the package id itself.
    pub fn app_name<'a>(&'a self, package_id: &'a str) -> &'a str {
        self.lookup(package_id)
            .map(|app| app.display_name.as_str())
            .unwrap_or(package_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedApp> {
        self.apps.iter()
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl Default for WatchedAppRegistry {
    fn default() -> Self {
        let apps = default_watched_apps();
        let index = apps
            .iter()
            .enumerate()
            .map(|(i, app)| (app.package_id.clone(), i))
            .collect();
        Self { apps, index }
    }
}

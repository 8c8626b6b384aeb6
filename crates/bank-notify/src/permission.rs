//! Notification-access permission checks.
//!
//! Android grants notification access per listener component; the list of
//! enabled components lives in a secure setting, and the only way to grant
//! access is for the user to flip it on in the system settings screen.
//!
//! # Permissions Required
//!
//! ```xml
//! <service android:name=".NotificationListener"
//!          android:permission="android.permission.BIND_NOTIFICATION_LISTENER_SERVICE"
//!          android:exported="true">
//!     <intent-filter>
//!         <action android:name="android.service.notification.NotificationListenerService" />
//!     </intent-filter>
//! </service>
//! ```

use crate::{NotifyError, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Secure setting holding the enabled listener components.
pub const ENABLED_NOTIFICATION_LISTENERS: &str = "enabled_notification_listeners";

/// Settings screen where the user grants notification access.
pub const ACTION_NOTIFICATION_LISTENER_SETTINGS: &str =
    "android.settings.ACTION_NOTIFICATION_LISTENER_SETTINGS";

/// `Intent.FLAG_ACTIVITY_NEW_TASK`
pub const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

/// A navigation request to a system settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsIntent {
    pub action: String,
    pub flags: i32,
}

impl SettingsIntent {
    /// Intent opening the notification listener settings screen.
    pub fn notification_listener_settings() -> Self {
        Self {
            action: ACTION_NOTIFICATION_LISTENER_SETTINGS.to_string(),
            flags: FLAG_ACTIVITY_NEW_TASK,
        }
    }
}

/// Access to the OS settings subsystem, supplied by the host.
pub trait SettingsProvider: Send + Sync {
    /// Read a secure setting. `Ok(None)` means the provider had no value.
    fn secure_setting(&self, key: &str) -> Result<Option<String>>;

    /// Dispatch a navigation intent. Returns once dispatched.
    fn start_activity(&self, intent: &SettingsIntent) -> Result<()>;
}

/// Decides whether a package appears in the enabled-listeners setting.
pub trait ListenerMatcher: Send + Sync {
    fn is_listed(&self, enabled_listeners: &str, package_id: &str) -> bool;
}

/// Plain substring test, as Android apps conventionally do it.
///
/// Prefix collisions count as a match (`com.app` matches `com.app.beta/...`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl ListenerMatcher for SubstringMatcher {
    fn is_listed(&self, enabled_listeners: &str, package_id: &str) -> bool {
        enabled_listeners.contains(package_id)
    }
}

/// Parses the setting as `:`-separated `package/class` component names and
/// compares the package part exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentListMatcher;

impl ListenerMatcher for ComponentListMatcher {
    fn is_listed(&self, enabled_listeners: &str, package_id: &str) -> bool {
        enabled_listeners
            .split(':')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .any(|component| {
                let package = component.split('/').next().unwrap_or(component);
                package == package_id
            })
    }
}

/// Result of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    NotGranted,
    /// The setting could not be read; says nothing about the grant.
    Unknown(String),
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Check and request notification access for this app.
pub struct PermissionGateway {
    provider: Arc<dyn SettingsProvider>,
    own_package: String,
    matcher: Box<dyn ListenerMatcher>,
}

impl PermissionGateway {
    pub fn new(provider: Arc<dyn SettingsProvider>, own_package: impl Into<String>) -> Self {
        Self {
            provider,
            own_package: own_package.into(),
            matcher: Box::new(SubstringMatcher),
        }
    }

    /// Replace the listener matching rule.
    pub fn with_matcher(mut self, matcher: impl ListenerMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn own_package(&self) -> &str {
        &self.own_package
    }

    /// Read the current grant state. Never cached.
    pub fn check(&self) -> PermissionState {
        if self.own_package.is_empty() {
            return PermissionState::Unknown("own package id is empty".to_string());
        }

        match self.provider.secure_setting(ENABLED_NOTIFICATION_LISTENERS) {
            Ok(Some(listeners)) => {
                if self.matcher.is_listed(&listeners, &self.own_package) {
                    PermissionState::Granted
                } else {
                    PermissionState::NotGranted
                }
            }
            Ok(None) => {
                warn!("{} is not available", ENABLED_NOTIFICATION_LISTENERS);
                PermissionState::Unknown(format!(
                    "{} is not available",
                    ENABLED_NOTIFICATION_LISTENERS
                ))
            }
            Err(e) => {
                warn!("Failed to read notification listener settings: {}", e);
                PermissionState::Unknown(e.to_string())
            }
        }
    }

    /// Open the notification access settings screen.
    ///
    /// Succeeds once the intent is dispatched; the user's decision is only
    /// visible through a later [`check`](Self::check).
    pub fn request(&self) -> Result<()> {
        info!("Requesting notification listener access");

        let intent = SettingsIntent::notification_listener_settings();
        self.provider.start_activity(&intent).map_err(|e| {
            error!("Failed to open notification listener settings: {}", e);
            match e {
                NotifyError::Dispatch(msg) => NotifyError::Dispatch(msg),
                other => NotifyError::Dispatch(other.to_string()),
            }
        })
    }

    /// Check, and open the settings screen when access is definitely missing.
    ///
    /// Returns the state observed before any request was made.
    pub fn ensure(&self) -> PermissionState {
        let state = self.check();

        if state == PermissionState::NotGranted {
            warn!("Notification access not granted - requesting...");
            if let Err(e) = self.request() {
                error!("Failed to request notification access: {}", e);
            }
        }

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeSettings {
        listeners: Option<String>,
        read_error: bool,
        dispatch_error: bool,
        dispatched: Mutex<Vec<SettingsIntent>>,
    }

    impl SettingsProvider for FakeSettings {
        fn secure_setting(&self, key: &str) -> Result<Option<String>> {
            assert_eq!(key, ENABLED_NOTIFICATION_LISTENERS);
            if self.read_error {
                return Err(NotifyError::Settings("content resolver unavailable".into()));
            }
            Ok(self.listeners.clone())
        }

        fn start_activity(&self, intent: &SettingsIntent) -> Result<()> {
            if self.dispatch_error {
                return Err(NotifyError::Dispatch("no activity context".into()));
            }
            self.dispatched.lock().push(intent.clone());
            Ok(())
        }
    }

    fn make_gateway(settings: FakeSettings) -> (PermissionGateway, Arc<FakeSettings>) {
        let settings = Arc::new(settings);
        (
            PermissionGateway::new(settings.clone(), "com.appfinancas"),
            settings,
        )
    }

    #[test]
    fn test_check_granted() {
        let (gateway, _) = make_gateway(FakeSettings {
            listeners: Some("com.appfinancas/NotificationListener:com.other/Service".into()),
            ..Default::default()
        });
        assert_eq!(gateway.check(), PermissionState::Granted);
    }

    #[test]
    fn test_check_not_granted() {
        let (gateway, _) = make_gateway(FakeSettings {
            listeners: Some("com.other/Service".into()),
            ..Default::default()
        });
        assert_eq!(gateway.check(), PermissionState::NotGranted);

        let (gateway, _) = make_gateway(FakeSettings {
            listeners: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(gateway.check(), PermissionState::NotGranted);
    }

    #[test]
    fn test_check_unknown_on_failure() {
        let (gateway, _) = make_gateway(FakeSettings {
            read_error: true,
            ..Default::default()
        });
        assert!(matches!(gateway.check(), PermissionState::Unknown(_)));

        let (gateway, _) = make_gateway(FakeSettings::default());
        assert!(matches!(gateway.check(), PermissionState::Unknown(_)));
    }

    #[test]
    fn test_check_is_idempotent() {
        let (gateway, _) = make_gateway(FakeSettings {
            listeners: Some("com.appfinancas/NotificationListener".into()),
            ..Default::default()
        });
        assert_eq!(gateway.check(), gateway.check());
    }

    #[test]
    fn test_substring_vs_component_matching() {
        let listeners = "com.appfinancas.beta/NotificationListener";

        assert!(SubstringMatcher.is_listed(listeners, "com.appfinancas"));
        assert!(!ComponentListMatcher.is_listed(listeners, "com.appfinancas"));
        assert!(ComponentListMatcher.is_listed(
            "com.other/Service:com.appfinancas/NotificationListener",
            "com.appfinancas"
        ));

        let (gateway, _) = make_gateway(FakeSettings {
            listeners: Some(listeners.into()),
            ..Default::default()
        });
        let gateway = gateway.with_matcher(ComponentListMatcher);
        assert_eq!(gateway.check(), PermissionState::NotGranted);
    }

    #[test]
    fn test_request_dispatches_intent() {
        let (gateway, settings) = make_gateway(FakeSettings::default());
        gateway.request().unwrap();

        let dispatched = settings.dispatched.lock();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].action, ACTION_NOTIFICATION_LISTENER_SETTINGS);
        assert_eq!(dispatched[0].flags, FLAG_ACTIVITY_NEW_TASK);
    }

    #[test]
    fn test_request_failure_surfaced() {
        let (gateway, _) = make_gateway(FakeSettings {
            dispatch_error: true,
            ..Default::default()
        });
        match gateway.request() {
            Err(NotifyError::Dispatch(msg)) => assert!(msg.contains("no activity context")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_ensure_requests_only_when_missing() {
        let (gateway, settings) = make_gateway(FakeSettings {
            listeners: Some("com.other/Service".into()),
            ..Default::default()
        });
        assert_eq!(gateway.ensure(), PermissionState::NotGranted);
        assert_eq!(settings.dispatched.lock().len(), 1);

        let (gateway, settings) = make_gateway(FakeSettings {
            read_error: true,
            ..Default::default()
        });
        assert!(matches!(gateway.ensure(), PermissionState::Unknown(_)));
        assert!(settings.dispatched.lock().is_empty());
    }
}

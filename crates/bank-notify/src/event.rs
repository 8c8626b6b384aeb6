//! Notification records coming in from the OS and events going out to the host.

use serde::{Deserialize, Serialize};

/// Name of the host event carrying a [`BankNotificationEvent`].
pub const BANK_NOTIFICATION_EVENT: &str = "onBankNotification";

/// A notification as posted by the OS.
///
/// Only the source package is guaranteed; apps are free to post
/// notifications without a title or text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Package that posted the notification
    pub package_id: String,

    /// `EXTRA_TITLE`, if present
    pub title: Option<String>,

    /// `EXTRA_TEXT`, if present
    pub body: Option<String>,
}

impl NotificationRecord {
    /// Create a record with no text fields.
    pub fn new(package_id: impl Into<String>) -> Self {
        Self {
            package_id: package_id.into(),
            title: None,
            body: None,
        }
    }

    /// Set the notification title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the notification body text.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A notification from a watched app, normalized for the host.
///
/// Built once per matched record and handed to the sink by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankNotificationEvent {
    pub package_id: String,
    pub app_name: String,
    pub title: String,
    pub body: String,
    pub timestamp_millis: i64,
}

/// Flat key/value shape the host receives with `onBankNotification`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub package_name: String,
    pub app_name: String,
    pub title: String,
    pub body: String,
    /// Epoch millis; the host bridge only carries doubles.
    pub timestamp: f64,
}

impl BankNotificationEvent {
    /// Event name the host listens on.
    pub fn name(&self) -> &'static str {
        BANK_NOTIFICATION_EVENT
    }

    /// Convert into the host payload.
    pub fn to_payload(&self) -> EventPayload {
        EventPayload {
            package_name: self.package_id.clone(),
            app_name: self.app_name.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            timestamp: self.timestamp_millis as f64,
        }
    }

    /// Serialize the host payload as a JSON object.
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_payload())?)
    }
}

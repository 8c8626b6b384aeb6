//! Bank Notification Bridge
//!
//! Listens to notifications posted system-wide, keeps the ones coming from a
//! small set of banking/payment apps and forwards their title and text to the
//! host application as `onBankNotification` events.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐
//! │  OS notification       │  ← NotificationListenerService callback
//! └───────────┬────────────┘
//!             │ NotificationRecord
//!             ▼
//! ┌────────────────────────┐
//! │ NotificationClassifier │  ← WatchedAppRegistry lookup
//! └───────────┬────────────┘
//!             │ BankNotificationEvent
//!             ▼
//! ┌────────────────────────┐
//! │  EventSink (host)      │  ← fire-and-forget
//! └────────────────────────┘
//!
//! ┌──────────────────────┐      ┌──────────────────────┐
//! │  PermissionGateway   │ ───▶ │  SettingsProvider    │ ← secure settings / intents
//! └──────────────────────┘      └──────────────────────┘
//! ```
//!
//! Only raw title and body are passed through; nothing here parses
//! amounts or merchants out of the text.

pub mod classifier;
pub mod config;
pub mod error;
pub mod event;
pub mod permission;
pub mod registry;
pub mod sink;

// Re-exports
pub use classifier::{DropReason, HandleOutcome, NotificationClassifier};
pub use config::ListenerConfig;
pub use error::{NotifyError, Result, SinkError};
pub use event::{BankNotificationEvent, EventPayload, NotificationRecord, BANK_NOTIFICATION_EVENT};
pub use permission::{PermissionGateway, PermissionState, SettingsIntent, SettingsProvider};
pub use registry::{WatchedApp, WatchedAppRegistry};
pub use sink::{ChannelSink, EventSink, SinkSlot};

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Host-facing listener: notification callbacks plus permission handling.
pub struct ListenerService {
    config: ListenerConfig,
    classifier: NotificationClassifier,
    permissions: PermissionGateway,
}

impl ListenerService {
    /// Create a listener service.
    ///
    /// The sink and settings provider are supplied by the host. Pass a
    /// [`SinkSlot`] as the sink if the host attaches its listener later.
    pub fn new(
        config: ListenerConfig,
        sink: Option<Arc<dyn EventSink>>,
        settings: Arc<dyn SettingsProvider>,
    ) -> Result<Self> {
        config.validate()?;

        let classifier = NotificationClassifier::new(config.registry()?, sink)
            .with_content_logging(config.log_contents);
        let permissions = PermissionGateway::new(settings, config.own_package.clone());

        info!(
            "Bank notification listener ready ({} watched apps)",
            classifier.registry().len()
        );

        Ok(Self {
            config,
            classifier,
            permissions,
        })
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    pub fn classifier(&self) -> &NotificationClassifier {
        &self.classifier
    }

    pub fn permissions(&self) -> &PermissionGateway {
        &self.permissions
    }

    /// OS callback: a notification was posted.
    pub fn on_notification_posted(&self, record: &NotificationRecord) -> HandleOutcome {
        if !self.config.enabled {
            return HandleOutcome::Ignored;
        }
        self.classifier.handle(record)
    }

    /// OS callback: a notification was removed.
    pub fn on_notification_removed(&self, package_id: &str) -> HandleOutcome {
        self.classifier.handle_removed(package_id)
    }

    pub fn check_permission(&self) -> PermissionState {
        self.permissions.check()
    }

    pub fn request_permission(&self) -> Result<()> {
        self.permissions.request()
    }

    /// Channel for hosts that deliver records asynchronously to [`run`](Self::run).
    ///
    /// Sized by `channel_capacity`, which [`ListenerConfig::validate`] keeps positive.
    pub fn record_channel(
        &self,
    ) -> (
        mpsc::Sender<NotificationRecord>,
        mpsc::Receiver<NotificationRecord>,
    ) {
        mpsc::channel(self.config.channel_capacity)
    }

    /// Handle records from a channel until every sender is dropped.
    ///
    /// Returns the number of events handed to the sink.
    pub async fn run(&self, mut records: mpsc::Receiver<NotificationRecord>) -> usize {
        info!("Starting bank notification listener");

        let mut emitted = 0;
        while let Some(record) = records.recv().await {
            if self.on_notification_posted(&record).is_emitted() {
                emitted += 1;
            }
        }

        info!("Bank notification listener stopped ({} events forwarded)", emitted);
        emitted
    }
}

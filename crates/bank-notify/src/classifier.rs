//! Classification of incoming notifications and forwarding to the host sink.

use crate::error::SinkError;
use crate::{BankNotificationEvent, EventSink, NotificationRecord, WatchedAppRegistry};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

/// Source of wall-clock epoch millis.
pub type Clock = fn() -> i64;

/// Current wall-clock time in epoch millis.
pub fn system_clock() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What happened to a single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    /// Not from a watched app (or the listener is disabled).
    Ignored,

    /// An event was handed to the sink.
    Emitted,

    /// A watched notification produced no delivered event.
    Dropped(DropReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// No sink attached; not an error.
    NoSink,

    /// The sink went away during emission.
    SinkUnavailable(String),

    /// The sink refused the event.
    SinkRejected(String),

    /// Classification failed unexpectedly.
    Internal(String),
}

impl HandleOutcome {
    pub fn is_emitted(&self) -> bool {
        matches!(self, Self::Emitted)
    }
}

/// Filters notifications against the watched-app registry and forwards
/// matches to the sink.
///
/// Stateless per call. `handle` never panics outward and never blocks; every
/// failure ends at this boundary as a [`HandleOutcome`].
pub struct NotificationClassifier {
    registry: WatchedAppRegistry,
    sink: Option<Arc<dyn EventSink>>,
    clock: Clock,
    log_contents: bool,
}

impl NotificationClassifier {
    /// Create a classifier. `sink = None` drops every matched event.
    pub fn new(registry: WatchedAppRegistry, sink: Option<Arc<dyn EventSink>>) -> Self {
        Self {
            registry,
            sink,
            clock: system_clock,
            log_contents: false,
        }
    }

    /// Override the timestamp source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Log notification title and body at debug level.
    pub fn with_content_logging(mut self, enabled: bool) -> Self {
        self.log_contents = enabled;
        self
    }

    pub fn registry(&self) -> &WatchedAppRegistry {
        &self.registry
    }

    /// Handle a posted notification.
    pub fn handle(&self, record: &NotificationRecord) -> HandleOutcome {
        match panic::catch_unwind(AssertUnwindSafe(|| self.process(record))) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(
                    "Error processing notification from {}: {}",
                    record.package_id, message
                );
                HandleOutcome::Dropped(DropReason::Internal(message))
            }
        }
    }

    /// Handle a removed notification. Nothing is forwarded for removals.
    pub fn handle_removed(&self, package_id: &str) -> HandleOutcome {
        trace!("Notification removed: {}", package_id);
        HandleOutcome::Ignored
    }

    /// Build the event for a record from a watched app.
    pub fn classify(&self, record: &NotificationRecord) -> Option<BankNotificationEvent> {
        if !self.registry.contains(&record.package_id) {
            return None;
        }

        if record.body.is_none() {
            debug!("Notification from {} has no body text", record.package_id);
        }

        Some(BankNotificationEvent {
            package_id: record.package_id.clone(),
            app_name: self.registry.app_name(&record.package_id).to_string(),
            title: record.title.clone().unwrap_or_default(),
            body: record.body.clone().unwrap_or_default(),
            timestamp_millis: (self.clock)(),
        })
    }

    fn process(&self, record: &NotificationRecord) -> HandleOutcome {
        let Some(event) = self.classify(record) else {
            return HandleOutcome::Ignored;
        };

        info!("Bank notification received: {}", event.package_id);
        if self.log_contents {
            debug!("Title: {}", event.title);
            debug!("Text: {}", event.body);
        }

        let Some(sink) = &self.sink else {
            trace!("No sink attached, dropping event");
            return HandleOutcome::Dropped(DropReason::NoSink);
        };

        match sink.emit(event) {
            Ok(()) => HandleOutcome::Emitted,
            Err(SinkError::NotAttached) => {
                trace!("No sink attached, dropping event");
                HandleOutcome::Dropped(DropReason::NoSink)
            }
            Err(SinkError::Unavailable(reason)) => {
                debug!("Sink unavailable, dropping event: {}", reason);
                HandleOutcome::Dropped(DropReason::SinkUnavailable(reason))
            }
            Err(SinkError::Rejected(reason)) => {
                debug!("Sink rejected event: {}", reason);
                HandleOutcome::Dropped(DropReason::SinkRejected(reason))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

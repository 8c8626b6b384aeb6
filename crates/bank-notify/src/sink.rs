//! Host-facing sinks that receive classified events.

use crate::error::SinkError;
use crate::{BankNotificationEvent, NotifyError, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Receiver of [`BankNotificationEvent`]s.
///
/// Emission is fire-and-forget: the sink takes ownership of the event and
/// there is no acknowledgment. Implementations must not block, since they
/// run on the OS notification callback thread.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BankNotificationEvent) -> std::result::Result<(), SinkError>;
}

impl<F> EventSink for F
where
    F: Fn(BankNotificationEvent) -> std::result::Result<(), SinkError> + Send + Sync,
{
    fn emit(&self, event: BankNotificationEvent) -> std::result::Result<(), SinkError> {
        self(event)
    }
}

/// A sink reference the host can attach and detach at runtime.
///
/// Emission takes a snapshot of the current sink under the read lock and
/// calls it after the lock is released, so a concurrent detach never tears
/// the call. With nothing attached, `emit` reports [`SinkError::NotAttached`].
#[derive(Default)]
pub struct SinkSlot {
    inner: RwLock<Option<Arc<dyn EventSink>>>,
}

impl SinkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a sink, replacing any previous one.
    pub fn attach(&self, sink: Arc<dyn EventSink>) {
        *self.inner.write() = Some(sink);
        debug!("Event sink attached");
    }

    /// Detach the current sink. Returns whether one was attached.
    pub fn detach(&self) -> bool {
        let was_attached = self.inner.write().take().is_some();
        if was_attached {
            debug!("Event sink detached");
        }
        was_attached
    }

    pub fn is_attached(&self) -> bool {
        self.inner.read().is_some()
    }
}

impl EventSink for SinkSlot {
    fn emit(&self, event: BankNotificationEvent) -> std::result::Result<(), SinkError> {
        let current = self.inner.read().clone();
        match current {
            Some(sink) => sink.emit(event),
            None => Err(SinkError::NotAttached),
        }
    }
}

/// Forwards events into a bounded tokio channel without blocking.
pub struct ChannelSink {
    tx: mpsc::Sender<BankNotificationEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<BankNotificationEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with the receiving half of its channel.
    ///
    /// A zero capacity is a configuration error.
    pub fn channel(capacity: usize) -> Result<(Self, mpsc::Receiver<BankNotificationEvent>)> {
        if capacity == 0 {
            return Err(NotifyError::Config(
                "channel capacity must be positive".into(),
            ));
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok((Self { tx }, rx))
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: BankNotificationEvent) -> std::result::Result<(), SinkError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Unavailable("channel full".into()),
            mpsc::error::TrySendError::Closed(_) => {
                SinkError::Unavailable("channel closed".into())
            }
        })
    }
}

//! Error types for the notification bridge.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Settings read failed: {0}")]
    Settings(String),

    #[error("Settings navigation failed: {0}")]
    Dispatch(String),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failures reported by an [`EventSink`](crate::EventSink) while emitting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    /// No host sink is currently attached.
    #[error("no sink attached")]
    NotAttached,

    /// The host side went away (detached, closed, or full).
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The host refused the event.
    #[error("sink rejected event: {0}")]
    Rejected(String),
}

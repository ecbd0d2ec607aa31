// Common types for the acquisition session manager

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for acquisition sessions (UUID v4, opaque to callers)
pub type SessionId = String;

/// Unique identifier for remote listeners
pub type ListenerId = String;

/// One reading pulled from the feed: one value per channel plus the
/// capture timestamp (seconds, feed clock when the backend provides one).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Sample {
    pub channels: Vec<f32>,
    pub timestamp: f64,
}

/// Current state of an acquisition session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum SessionState {
    /// Session registered but not yet connecting
    Idle,

    /// Helper starting and feed resolution in progress
    Connecting,

    /// Samples are being relayed
    Streaming { started_at: f64 },

    /// Feed lost, re-resolution in progress
    Reconnecting,

    /// Duration elapsed, session ended normally
    Finished,

    /// Session ended with an unrecoverable error
    Failed { message: String },
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Events relayed to the listener through the [`EventSink`].
///
/// The set is closed and per-session emission order is preserved:
/// `Connected` precedes any `NewSample`, and exactly one of `Finished` or
/// `ConnectionError` ends the stream of events.
///
/// [`EventSink`]: crate::sink::EventSink
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data")]
pub enum SessionEvent {
    /// Feed resolved, streaming begins
    Connected,

    /// One successfully pulled sample, relayed verbatim
    NewSample { sample: Sample },

    /// Human-readable progress: connecting, reconnect success, rejections
    StatusUpdate { message: String },

    /// Startup failure, resolution exhaustion, or unrecoverable error
    ConnectionError { error: String },

    /// Duration elapsed, session ended normally
    Finished,
}

/// Helper binary misconfiguration. Fatal to the session, never to the
/// hosting process; nothing is spawned when validation fails.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("streaming helper not found at {0}")]
    NotFound(PathBuf),

    #[error("streaming helper at {0} is not executable")]
    NotExecutable(PathBuf),

    #[error("failed to spawn streaming helper: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Feed discovery failure
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no feed found after {attempts} discovery attempts")]
    NoFeedFound { attempts: u32 },

    #[error("discovery backend error: {0}")]
    Backend(String),
}

/// Mid-stream feed loss. Recoverable: the orchestrator re-resolves the
/// feed within its reconnect budget before giving up.
#[derive(Debug, Error)]
#[error("feed connection lost: {0}")]
pub struct FeedLost(pub String);

/// Rejected start command. No session is created and no resource is
/// acquired when one of these is returned.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid duration {0}, must be a positive number of seconds")]
    InvalidDuration(i64),

    #[error("a recording is already in progress for listener {0}")]
    AlreadyRecording(ListenerId),
}

/// Union of the failures the orchestrator catches at its boundary and
/// converts to a `ConnectionError` event.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Startup(#[from] StartupError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = SessionEvent::NewSample {
            sample: Sample {
                channels: vec![1.0, 2.0],
                timestamp: 42.5,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"NewSample\""));

        let back: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn terminal_events_have_no_payload() {
        let json = serde_json::to_string(&SessionEvent::Finished).unwrap();
        assert_eq!(json, "{\"type\":\"Finished\"}");
    }
}

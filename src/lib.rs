//! Acquisition session manager for bounded-duration Muse EEG streaming.
//!
//! Supervises the external `muselsl`-style helper process, resolves the
//! data feed it publishes over Lab Streaming Layer, and relays every
//! sample plus lifecycle events to an [`EventSink`] owned by the transport
//! layer. One [`SessionManager`] serves many listeners; each listener gets
//! at most one live session at a time, and every session guarantees helper
//! termination on every exit path.
//!
//! The real LSL backend is behind the `lsl-support` feature; the core is
//! written against the [`FeedResolver`]/[`SampleFeed`] seams so transports
//! and tests can plug in their own feeds.

pub mod config;
pub mod feed;
pub mod helper;
pub mod session;
pub mod sink;
pub mod types;

pub use config::{AcquisitionConfig, RetryBudget};
#[cfg(feature = "lsl-support")]
pub use feed::LslResolver;
pub use feed::{resolve_with_retry, FeedResolver, SampleFeed};
pub use helper::StreamHelper;
pub use session::SessionManager;
pub use sink::EventSink;
pub use types::{
    CommandError, FeedLost, ListenerId, ResolveError, Sample, SessionEvent, SessionId,
    SessionState, StartupError,
};

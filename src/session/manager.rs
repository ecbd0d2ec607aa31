// Per-listener session registry
//
// One live session per listener identity: a duplicate start command is
// rejected with a status event and leaves the running session untouched.
// Runs execute as independent tokio tasks so the command-handling path
// stays responsive while sessions stream.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AcquisitionConfig;
use crate::feed::FeedResolver;
use crate::sink::EventSink;
use crate::types::{CommandError, ListenerId, SessionEvent, SessionId, SessionState};

use super::orchestrator::SessionRun;

/// Registry entry for one live (or recently ended) session.
struct SessionHandle {
    id: SessionId,
    state: Arc<RwLock<SessionState>>,
    join: JoinHandle<()>,
}

impl SessionHandle {
    fn is_live(&self) -> bool {
        !self.join.is_finished()
    }
}

/// Manages acquisition sessions keyed by listener identity.
#[derive(Clone)]
pub struct SessionManager {
    config: AcquisitionConfig,
    resolver: Arc<dyn FeedResolver>,
    sessions: Arc<RwLock<HashMap<ListenerId, SessionHandle>>>,
    shutdown: CancellationToken,
}

impl SessionManager {
    pub fn new(config: AcquisitionConfig, resolver: Arc<dyn FeedResolver>) -> Self {
        Self {
            config,
            resolver,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    /// Handle a start command: validate the duration, reject a duplicate
    /// start for a listener with a live session, otherwise spawn the run.
    ///
    /// Rejections surface to the listener as a `StatusUpdate` event before
    /// the error is returned to the transport.
    pub async fn start(
        &self,
        listener: &str,
        duration_secs: i64,
        sink: Arc<dyn EventSink>,
    ) -> Result<SessionId, CommandError> {
        if duration_secs <= 0 {
            warn!(
                "rejected start for listener {}: invalid duration {}",
                listener, duration_secs
            );
            sink.emit(SessionEvent::StatusUpdate {
                message: "Invalid duration provided. Please enter a positive integer.".to_string(),
            })
            .await;
            return Err(CommandError::InvalidDuration(duration_secs));
        }

        let started = {
            let mut sessions = self.sessions.write();

            // Entries whose runs already ended are reaped in place
            sessions.retain(|_, handle| handle.is_live());

            if sessions.contains_key(listener) {
                None
            } else {
                let id: SessionId = uuid::Uuid::new_v4().to_string();
                let state = Arc::new(RwLock::new(SessionState::Idle));

                let run = SessionRun {
                    id: id.clone(),
                    duration: Duration::from_secs(duration_secs as u64),
                    config: self.config.clone(),
                    resolver: Arc::clone(&self.resolver),
                    sink: Arc::clone(&sink),
                    state: Arc::clone(&state),
                    cancel: self.shutdown.child_token(),
                };
                let join = tokio::spawn(run.run());

                sessions.insert(
                    listener.to_string(),
                    SessionHandle {
                        id: id.clone(),
                        state,
                        join,
                    },
                );
                Some(id)
            }
        };

        match started {
            Some(id) => {
                info!(
                    "started session {} for listener {} ({}s)",
                    id, listener, duration_secs
                );
                Ok(id)
            }
            None => {
                warn!(
                    "rejected start for listener {}: recording already in progress",
                    listener
                );
                sink.emit(SessionEvent::StatusUpdate {
                    message: "Recording is already in progress".to_string(),
                })
                .await;
                Err(CommandError::AlreadyRecording(listener.to_string()))
            }
        }
    }

    /// Current state of a listener's most recent session, if still tracked.
    pub fn state_of(&self, listener: &str) -> Option<SessionState> {
        self.sessions
            .read()
            .get(listener)
            .map(|h| h.state.read().clone())
    }

    /// Id of a listener's most recent session, if still tracked.
    pub fn session_id_of(&self, listener: &str) -> Option<SessionId> {
        self.sessions.read().get(listener).map(|h| h.id.clone())
    }

    /// Whether a listener has a session whose run has not ended yet.
    pub fn is_live(&self, listener: &str) -> bool {
        self.sessions
            .read()
            .get(listener)
            .map(|h| h.is_live())
            .unwrap_or(false)
    }

    /// Cancel every live session. This is the process shutdown path;
    /// apart from it, sessions end only through their duration bound or
    /// a failure.
    pub fn shutdown(&self) {
        info!("shutting down all sessions");
        self.shutdown.cancel();
    }

    /// Wait for every tracked session to end, reaping the registry.
    pub async fn join_all(&self) {
        let joins: Vec<JoinHandle<()>> = {
            let mut sessions = self.sessions.write();
            sessions.drain().map(|(_, handle)| handle.join).collect()
        };

        for join in joins {
            join.await.ok();
        }
    }
}

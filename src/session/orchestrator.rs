// Session orchestrator - one bounded-duration acquisition run
//
// Drives the helper process, feed resolution and the streaming loop as a
// single state machine:
//
//   Connecting -> Streaming <-> Reconnecting -> Finished | Failed
//
// Helper termination runs unconditionally between the run outcome and the
// terminal event, so every session ends with the helper gone and exactly
// one terminal event emitted last. Component failures never escape this
// task; they surface to the listener as a `ConnectionError` event.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AcquisitionConfig;
use crate::feed::{resolve_with_retry, FeedResolver, SampleFeed};
use crate::helper::StreamHelper;
use crate::sink::EventSink;
use crate::types::{SessionError, SessionEvent, SessionId, SessionState};

pub(crate) struct SessionRun {
    pub id: SessionId,
    pub duration: Duration,
    pub config: AcquisitionConfig,
    pub resolver: Arc<dyn FeedResolver>,
    pub sink: Arc<dyn EventSink>,
    pub state: Arc<RwLock<SessionState>>,
    pub cancel: CancellationToken,
}

impl SessionRun {
    pub async fn run(self) {
        let Self {
            id,
            duration,
            config,
            resolver,
            sink,
            state,
            cancel,
        } = self;

        *state.write() = SessionState::Connecting;
        sink.emit(SessionEvent::StatusUpdate {
            message: "Connecting to Muse...".to_string(),
        })
        .await;

        let mut helper = None;
        let outcome = match StreamHelper::spawn(&config.helper_path) {
            Ok(spawned) => {
                helper = Some(spawned);
                tokio::select! {
                    biased;

                    _ = cancel.cancelled() => {
                        info!("session {}: shutdown requested", id);
                        Ok(())
                    }
                    res = drive(&id, duration, &config, resolver.as_ref(), sink.as_ref(), &state) => res,
                }
            }
            Err(e) => Err(SessionError::from(e)),
        };

        // Cleanup runs on every path before the terminal event
        if let Some(mut helper) = helper {
            helper.terminate().await;
        }

        match outcome {
            Ok(()) => {
                info!("session {}: finished", id);
                *state.write() = SessionState::Finished;
                sink.emit(SessionEvent::Finished).await;
            }
            Err(e) => {
                let message = e.to_string();
                warn!("session {}: failed: {}", id, message);
                *state.write() = SessionState::Failed {
                    message: message.clone(),
                };
                sink.emit(SessionEvent::ConnectionError { error: message }).await;
            }
        }
    }
}

/// Connect and stream until the duration elapses.
///
/// The duration bound is enforced with `sleep_until` around the whole
/// streaming phase, so it preempts pulls and in-flight reconnection
/// attempts at their next await point.
async fn drive(
    id: &SessionId,
    duration: Duration,
    config: &AcquisitionConfig,
    resolver: &dyn FeedResolver,
    sink: &dyn EventSink,
    state: &RwLock<SessionState>,
) -> Result<(), SessionError> {
    // Give the helper time to bring the feed up before the first query
    sleep(config.warmup).await;

    let mut feed = resolve_with_retry(resolver, &config.stream_type, &config.connect).await?;

    // Timing starts once the feed is connected
    let deadline = Instant::now() + duration;
    let started_at = chrono::Utc::now().timestamp() as f64;

    *state.write() = SessionState::Streaming { started_at };
    sink.emit(SessionEvent::Connected).await;
    info!("session {}: connected to {} feed", id, config.stream_type);

    tokio::select! {
        biased;

        _ = sleep_until(deadline) => Ok(()),
        res = stream_loop(id, config, resolver, sink, state, started_at, &mut feed) => res,
    }
}

async fn stream_loop(
    id: &SessionId,
    config: &AcquisitionConfig,
    resolver: &dyn FeedResolver,
    sink: &dyn EventSink,
    state: &RwLock<SessionState>,
    started_at: f64,
    feed: &mut Box<dyn SampleFeed>,
) -> Result<(), SessionError> {
    loop {
        match feed.pull(config.pull_timeout).await {
            Ok(Some(sample)) => {
                sink.emit(SessionEvent::NewSample { sample }).await;
                // Yield so one session cannot starve its siblings
                sleep(config.emit_pause).await;
            }
            Ok(None) => continue,
            Err(lost) => {
                warn!("session {}: {}", id, lost);
                *state.write() = SessionState::Reconnecting;

                *feed =
                    resolve_with_retry(resolver, &config.stream_type, &config.reconnect).await?;

                *state.write() = SessionState::Streaming { started_at };
                sink.emit(SessionEvent::StatusUpdate {
                    message: format!("Reconnected to {} stream", config.stream_type),
                })
                .await;
                info!("session {}: reconnected to {} feed", id, config.stream_type);
            }
        }
    }
}

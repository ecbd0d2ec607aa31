// Lab Streaming Layer backed resolver and feed
//
// liblsl is a synchronous API; discovery runs inside `spawn_blocking` and
// each opened feed gets a dedicated blocking pump that forwards samples
// over a channel, so session tasks never block the async runtime.

use std::time::Duration;

use async_trait::async_trait;
use lsl::Pullable;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{info, warn};

use crate::types::{FeedLost, ResolveError, Sample};

use super::{FeedResolver, SampleFeed};

/// Block interval of the pump's pull; bounds how long the pump lingers
/// after its feed handle is dropped.
const PUMP_BLOCK_SECS: f64 = 1.0;

const PUMP_CHANNEL_CAPACITY: usize = 64;

/// Resolver backed by the LSL discovery protocol.
#[derive(Debug, Default)]
pub struct LslResolver;

#[async_trait]
impl FeedResolver for LslResolver {
    async fn resolve(
        &self,
        stream_type: &str,
        timeout: Duration,
    ) -> Result<Option<Box<dyn SampleFeed>>, ResolveError> {
        let predicate = format!("type='{}'", stream_type);
        let secs = timeout.as_secs_f64();

        let resolved = task::spawn_blocking(move || {
            let streams = lsl::resolve_bypred(&predicate, 1, secs);
            if streams.len() > 1 {
                warn!(
                    "multiple matching feeds found ({}), using first match",
                    streams.len()
                );
            }

            let Some(stream_info) = streams.into_iter().next() else {
                return Ok(None);
            };

            info!(
                "resolved feed: name='{}', type='{}', {} channels @ {} Hz",
                stream_info.name(),
                stream_info.stream_type(),
                stream_info.channel_count(),
                stream_info.sampling_rate()
            );

            let inlet = lsl::StreamInlet::new(&stream_info, 360, 1, true)
                .map_err(|e| ResolveError::Backend(format!("failed to create inlet: {:?}", e)))?;

            Ok(Some(inlet))
        })
        .await
        .map_err(|e| ResolveError::Backend(format!("resolver task failed: {}", e)))??;

        match resolved {
            Some(inlet) => Ok(Some(Box::new(LslFeed::new(inlet)))),
            None => Ok(None),
        }
    }
}

/// Feed handle over a running pump; dropping it stops the pump.
struct LslFeed {
    rx: mpsc::Receiver<Result<Sample, FeedLost>>,
}

impl LslFeed {
    fn new(inlet: lsl::StreamInlet) -> Self {
        let (tx, rx) = mpsc::channel(PUMP_CHANNEL_CAPACITY);
        task::spawn_blocking(move || pump(inlet, tx));
        Self { rx }
    }
}

#[async_trait]
impl SampleFeed for LslFeed {
    async fn pull(&mut self, timeout: Duration) -> Result<Option<Sample>, FeedLost> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(Ok(sample))) => Ok(Some(sample)),
            Ok(Some(Err(lost))) => Err(lost),
            Ok(None) => Err(FeedLost("sample pump ended".to_string())),
            Err(_) => Ok(None),
        }
    }
}

fn pump(inlet: lsl::StreamInlet, tx: mpsc::Sender<Result<Sample, FeedLost>>) {
    loop {
        match inlet.pull_sample(PUMP_BLOCK_SECS) {
            Ok((channels, timestamp)) => {
                // liblsl signals an empty pull with a zero timestamp
                if timestamp == 0.0 || channels.is_empty() {
                    if tx.is_closed() {
                        break;
                    }
                    continue;
                }

                let sample = Sample {
                    channels,
                    timestamp,
                };
                if tx.blocking_send(Ok(sample)).is_err() {
                    // Feed handle dropped on reconnect or session end
                    break;
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(FeedLost(format!("{:?}", e))));
                break;
            }
        }
    }
}

// Acquisition configuration
//
// Defaults mirror the muselsl deployment this crate was built around: a 3s
// warm-up after the helper starts, a 10s first discovery attempt shortened
// to 5s on retries, 2s backoff, and a 1s pull timeout.

use std::path::PathBuf;
use std::time::Duration;

/// Retry budget for one use of the stream resolver.
///
/// Initial connection and reconnection after feed loss carry independent
/// budgets. A budget allows `max_retries + 1` discovery attempts in total.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    /// Timeout for the first discovery attempt
    pub first_timeout: Duration,

    /// Shortened timeout for each retry attempt
    pub retry_timeout: Duration,

    /// Additional attempts after the first
    pub max_retries: u32,

    /// Fixed sleep between attempts
    pub backoff: Duration,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            first_timeout: Duration::from_secs(10),
            retry_timeout: Duration::from_secs(5),
            max_retries: 5,
            backoff: Duration::from_secs(2),
        }
    }
}

/// Configuration shared by every session a manager runs.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Streaming helper executable; a bare file name is resolved on PATH
    pub helper_path: PathBuf,

    /// Feed type tag to resolve (the LSL `type` property, e.g. "EEG")
    pub stream_type: String,

    /// Wait after helper start before the first discovery attempt
    pub warmup: Duration,

    /// Retry budget for the initial connection
    pub connect: RetryBudget,

    /// Retry budget for reconnection after feed loss
    pub reconnect: RetryBudget,

    /// Per-pull timeout in the streaming loop
    pub pull_timeout: Duration,

    /// Voluntary yield after each emitted sample
    pub emit_pause: Duration,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            helper_path: PathBuf::from("muselsl"),
            stream_type: "EEG".to_string(),
            warmup: Duration::from_secs(3),
            connect: RetryBudget::default(),
            reconnect: RetryBudget {
                first_timeout: Duration::from_secs(5),
                ..RetryBudget::default()
            },
            pull_timeout: Duration::from_secs(1),
            emit_pause: Duration::from_millis(10),
        }
    }
}

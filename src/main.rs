// Demo entry point: one acquisition session driven from the command line,
// events printed as JSON lines. The real transport layer replaces this by
// implementing `EventSink` over its own delivery channel.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use muse_acquisition::{AcquisitionConfig, EventSink, LslResolver, SessionEvent, SessionManager};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "muse-acquisition",
    about = "Record a bounded-duration Muse EEG session and print events as JSON lines"
)]
struct Args {
    /// Path to the muselsl-style streaming helper
    #[arg(long, env = "MUSE_HELPER", default_value = "muselsl")]
    helper: PathBuf,

    /// Recording duration in seconds
    #[arg(long, default_value_t = 5)]
    duration: i64,

    /// Feed type tag to resolve
    #[arg(long, default_value = "EEG")]
    stream_type: String,
}

struct StdoutSink;

#[async_trait]
impl EventSink for StdoutSink {
    async fn emit(&self, event: SessionEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            println!("{}", line);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "muse_acquisition=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = AcquisitionConfig {
        helper_path: args.helper,
        stream_type: args.stream_type,
        ..AcquisitionConfig::default()
    };

    let manager = SessionManager::new(config, Arc::new(LslResolver));
    let session_id = manager
        .start("cli", args.duration, Arc::new(StdoutSink))
        .await?;
    info!("session {} started", session_id);

    {
        let manager = manager.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                manager.shutdown();
            }
        });
    }

    manager.join_all().await;

    Ok(())
}

/// Rates Log
///
/// Headless variant of the board: runs the same refresh loop and prints every board event
/// to stdout as one JSON line until Ctrl-C. Logs go to stderr.
use std::error::Error;

use rates_data::{
    client::HttpFeedClient,
    config::BoardConfig,
    refresh::RefreshOrchestrator,
    schedule::{RefreshSchedule, spawn_refresh_loop},
    sink::ChannelSink,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let config = BoardConfig::from_env()?;
    info!(
        mode = %config.mode,
        refresh_interval_ms = config.refresh_interval_ms,
        "starting rates log"
    );

    let client = HttpFeedClient::new(config.request_timeout())?;
    let (sink, mut event_rx) = ChannelSink::new();

    let schedule = RefreshSchedule::from(&config);
    let handle = spawn_refresh_loop(RefreshOrchestrator::new(config, client, sink), schedule);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            result = &mut shutdown => {
                if let Err(error) = result {
                    warn!(%error, "failed to listen for Ctrl-C");
                }
                break;
            }

            event = event_rx.recv() => match event {
                Some(event) => match serde_json::to_string(&event) {
                    Ok(json) => println!("{json}"),
                    Err(error) => warn!(
                        %error,
                        instrument = %event.instrument(),
                        "failed to serialise board event"
                    ),
                },
                None => break,
            },
        }
    }

    info!("shutting down");
    let orchestrator = handle.stop().await?;
    info!(phase = ?orchestrator.phase(), "rates log stopped");
    Ok(())
}

/// Initialize logging
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

//! Logging initialization: logs go only to file (or are dropped), never to console.
//!
//! Reads `RUST_LOG` (level) and `LOG_FILE` (path) from env (e.g. via .env).
//! When `LOG_FILE` is set, logs are appended to that file; otherwise logs are
//! dropped so stdout stays clean for the conversation.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Initializes tracing so that logs are never printed to the console.
///
/// - **RUST_LOG**: Log level filter, e.g. `info`, `debug`, `weft=trace`.
///   Default: `info`.
/// - **LOG_FILE**: When set, logs are appended to this file (plain text, no
///   ANSI). When unset, logs are dropped.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,hyper_util=off"));

    if let Ok(path) = std::env::var("LOG_FILE") {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_filter(filter);
        tracing_subscriber::registry().with(file_layer).init();
        tracing::info!(path = %path, "weft logging to file");
    } else {
        let sink_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::sink)
            .with_filter(filter);
        tracing_subscriber::registry().with(sink_layer).init();
    }
    Ok(())
}

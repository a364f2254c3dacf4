use std::io;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. Filter comes from `RUST_LOG`, defaulting to
/// `info`. Logs go to stderr so stdout stays free for `--echo` output.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
}

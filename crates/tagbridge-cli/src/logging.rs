//! Logging setup.

use anyhow::anyhow;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. Logs go to stderr so stdout stays
/// clean for JSON output.
pub fn init_logging(level: &str, json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}"))
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .map_err(|e| anyhow!("failed to initialize logging: {e}"))
    }
}

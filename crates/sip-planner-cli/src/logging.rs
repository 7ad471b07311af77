use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// Install the global subscriber. Logs go to stderr so piped JSON on stdout
/// stays clean.
pub fn init_logging(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;

    Ok(())
}

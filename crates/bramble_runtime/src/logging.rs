//! Tracing subscriber setup for the command-line tools.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BRAMBLE_LOG";

/// Filter used when neither `--log` nor the environment sets one.
pub const DEFAULT_FILTER: &str = "warn";

static INIT: OnceLock<()> = OnceLock::new();

/// Builds the filter: `level` wins, then `BRAMBLE_LOG`, then `warn`.
#[must_use]
pub fn filter(level: Option<&str>) -> EnvFilter {
    level
        .and_then(|level| EnvFilter::try_new(level).ok())
        .or_else(|| EnvFilter::try_from_env(LOG_ENV).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber, once. Logs go to stderr so they never
/// mix with story text.
pub fn init(level: Option<&str>) {
    INIT.get_or_init(|| {
        let installed = SubscriberBuilder::default()
            .with_env_filter(filter(level))
            .with_writer(std::io::stderr)
            .with_target(true)
            .compact()
            .try_init();
        if installed.is_ok() {
            tracing::debug!("tracing initialised");
        }
    });
}

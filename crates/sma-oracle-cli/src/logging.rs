use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Logs go to stderr; stdout carries command
/// output only.
pub fn init(default_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid log filter {default_level:?}: {e}"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json { builder.json().try_init() } else { builder.compact().try_init() };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

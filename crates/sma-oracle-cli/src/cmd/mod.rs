use anyhow::Result;
use serde::Serialize;
use sma_oracle_client::{BootstrapFailure, DerivedAddress, ErrorClass, Stage};

use crate::args::{Cli, Command};
use crate::output;

mod derive;
mod initialize;
mod status;

/// Run the selected command. `Ok(false)` means the command ran and reported
/// a classified failure.
pub async fn dispatch(cli: Cli) -> Result<bool> {
    match cli.command.clone() {
        Command::Derive => derive::run(&cli),
        Command::Initialize { max_attempts, confirm_timeout_secs, poll_interval_ms, skip_existing_check } => {
            let opts = initialize::Options { max_attempts, confirm_timeout_secs, poll_interval_ms, skip_existing_check };
            initialize::run(&cli, opts).await
        }
        Command::Status => status::run(&cli).await,
    }
}

#[derive(Debug, Serialize)]
pub struct FailureOut {
    pub ok: bool,
    pub stage: Stage,
    pub class: ErrorClass,
    pub retriable: bool,
    pub message: String,
    pub oracle_state: Option<DerivedAddress>,
}

impl From<&BootstrapFailure> for FailureOut {
    fn from(f: &BootstrapFailure) -> Self {
        Self {
            ok: false,
            stage: f.error.stage(),
            class: f.error.class(),
            retriable: f.error.is_retriable(),
            message: f.error.to_string(),
            oracle_state: f.oracle_state,
        }
    }
}

pub fn report_failure(failure: &BootstrapFailure) -> Result<bool> {
    tracing::error!(stage = %failure.error.stage(), class = failure.error.class().as_str(), "{}", failure.error);
    output::print(&FailureOut::from(failure))?;
    Ok(false)
}

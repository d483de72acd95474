use anyhow::Result;
use serde::Serialize;
use sma_oracle_client::{derive_address, is_program_address, validate_config, BootstrapFailure, DerivedAddress};

use crate::args::Cli;
use crate::output;

#[derive(Debug, Serialize)]
pub struct DeriveOut {
    pub ok: bool,
    pub program_id: String,
    pub seed: String,
    pub oracle_state: DerivedAddress,
    pub off_curve: bool,
}

pub fn run(cli: &Cli) -> Result<bool> {
    let cfg = match cli.bootstrap_config() {
        Ok(cfg) => cfg,
        Err(error) => return super::report_failure(&BootstrapFailure { error, oracle_state: None }),
    };

    let derived = validate_config(&cfg).and_then(|()| {
        let program_id = cfg.require_program_id()?;
        Ok((program_id, derive_address(&[cfg.seed.as_slice()], &program_id)?))
    });

    match derived {
        Ok((program_id, oracle_state)) => {
            output::print(&DeriveOut {
                ok: true,
                program_id: program_id.to_string(),
                seed: String::from_utf8_lossy(&cfg.seed).into_owned(),
                off_curve: is_program_address(&oracle_state.address),
                oracle_state,
            })?;
            Ok(true)
        }
        Err(error) => super::report_failure(&BootstrapFailure { error, oracle_state: None }),
    }
}

use anyhow::Result;
use serde::Serialize;
use sma_oracle_client::{Bootstrap, BootstrapFailure, InitializeReport, RpcNetwork};
use solana_sdk::signature::Signer;

use crate::args::{self, Cli};
use crate::keys;
use crate::output;

pub struct Options {
    pub max_attempts: u32,
    pub confirm_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub skip_existing_check: bool,
}

#[derive(Debug, Serialize)]
pub struct InitializeOut {
    pub ok: bool,
    pub cluster: String,
    pub authority: String,
    #[serde(flatten)]
    pub report: InitializeReport,
}

pub async fn run(cli: &Cli, opts: Options) -> Result<bool> {
    let mut cfg = match cli.bootstrap_config() {
        Ok(cfg) => cfg,
        Err(error) => return super::report_failure(&BootstrapFailure { error, oracle_state: None }),
    };
    cfg.submit = args::submit_settings(cfg.submit, opts.max_attempts, opts.confirm_timeout_secs, opts.poll_interval_ms);
    cfg.check_existing = !opts.skip_existing_check;

    let network = RpcNetwork::new(&cli.rpc_url(), cfg.submit.commitment);
    let bootstrap = Bootstrap::new(cfg, &network);

    // Configuration and key problems are reported before any RPC call.
    let oracle_state = match bootstrap.derive() {
        Ok(derived) => derived,
        Err(error) => return super::report_failure(&BootstrapFailure { error, oracle_state: None }),
    };
    let authority = match keys::load_authority(&cli.keypair) {
        Ok(kp) => kp,
        Err(error) => return super::report_failure(&BootstrapFailure { error, oracle_state: Some(oracle_state) }),
    };

    tracing::info!(cluster = %network.url(), authority = %authority.pubkey(), "initializing oracle state");

    match bootstrap.run(&authority).await {
        Ok(report) => {
            output::print(&InitializeOut {
                ok: true,
                cluster: network.url(),
                authority: authority.pubkey().to_string(),
                report,
            })?;
            Ok(true)
        }
        Err(failure) => super::report_failure(&failure),
    }
}

use anyhow::Result;
use serde::Serialize;
use sma_oracle_client::{Bootstrap, BootstrapFailure, OracleStateStatus, RpcNetwork};

use crate::args::Cli;
use crate::output;

#[derive(Debug, Serialize)]
pub struct StatusOut {
    pub ok: bool,
    pub cluster: String,
    #[serde(flatten)]
    pub status: OracleStateStatus,
}

pub async fn run(cli: &Cli) -> Result<bool> {
    let cfg = match cli.bootstrap_config() {
        Ok(cfg) => cfg,
        Err(error) => return super::report_failure(&BootstrapFailure { error, oracle_state: None }),
    };
    let network = RpcNetwork::new(&cli.rpc_url(), cfg.submit.commitment);

    match Bootstrap::new(cfg, &network).inspect().await {
        Ok(status) => {
            output::print(&StatusOut { ok: true, cluster: network.url(), status })?;
            Ok(true)
        }
        Err(failure) => super::report_failure(&failure),
    }
}

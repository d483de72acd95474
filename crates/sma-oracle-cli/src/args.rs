use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use sma_oracle_client::{
    BootstrapConfig, BootstrapError, BootstrapResult, RetryPolicy, Stage, SubmitConfig, DEFAULT_KEYPAIR_PATH,
    DEFAULT_PROGRAM_ID, DEFAULT_RPC_URL,
};
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::pubkey::Pubkey;

#[derive(Parser, Debug, Clone)]
#[command(name = "sma-oracle", version, about = "Bootstrap the SMA oracle program state")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// RPC URL or moniker (devnet, testnet, mainnet-beta, localhost).
    #[arg(long, short = 'u', global = true, env = "SOLANA_URL", default_value = "devnet")]
    pub url: String,

    /// Authority keypair file.
    #[arg(long, short = 'k', global = true, env = "SOLANA_KEYPAIR", default_value = DEFAULT_KEYPAIR_PATH)]
    pub keypair: String,

    /// Oracle program id (base58). Defaults to the deployed program.
    #[arg(long, global = true, env = "SMA_ORACLE_PROGRAM_ID")]
    pub program_id: Option<String>,

    #[arg(long, global = true, value_enum, default_value_t = Commitment::Confirmed)]
    pub commitment: Commitment,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the oracle state address and bump (offline).
    Derive,

    /// Send the `initialize` transaction and wait for confirmation.
    Initialize {
        /// Total attempts for transient failures (1 = no retry).
        #[arg(long, default_value_t = 1)]
        max_attempts: u32,

        #[arg(long, default_value_t = 60)]
        confirm_timeout_secs: u64,

        #[arg(long, default_value_t = 500)]
        poll_interval_ms: u64,

        /// Send even if the state account already exists.
        #[arg(long)]
        skip_existing_check: bool,
    },

    /// Show whether the oracle state account exists on the cluster.
    Status,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl From<Commitment> for CommitmentLevel {
    fn from(c: Commitment) -> Self {
        match c {
            Commitment::Processed => CommitmentLevel::Processed,
            Commitment::Confirmed => CommitmentLevel::Confirmed,
            Commitment::Finalized => CommitmentLevel::Finalized,
        }
    }
}

impl Cli {
    /// Resolve `--url`, expanding cluster monikers.
    pub fn rpc_url(&self) -> String {
        resolve_url(&self.url)
    }

    /// `None` when the program id was explicitly blanked out.
    pub fn program_id(&self) -> BootstrapResult<Option<Pubkey>> {
        match self.program_id.as_deref().map(str::trim) {
            None => Ok(Some(DEFAULT_PROGRAM_ID)),
            Some("") => Ok(None),
            Some(s) => s
                .parse::<Pubkey>()
                .map(Some)
                .map_err(|e| BootstrapError::configuration(Stage::Config, format!("invalid program id {s}: {e}"))),
        }
    }

    /// Core configuration from global flags; `initialize` refines it.
    pub fn bootstrap_config(&self) -> BootstrapResult<BootstrapConfig> {
        Ok(BootstrapConfig {
            program_id: self.program_id()?,
            submit: SubmitConfig { commitment: self.commitment.into(), ..SubmitConfig::default() },
            ..BootstrapConfig::default()
        })
    }
}

pub fn resolve_url(url: &str) -> String {
    match url.trim() {
        "devnet" | "d" => DEFAULT_RPC_URL.to_string(),
        "testnet" | "t" => "https://api.testnet.solana.com".to_string(),
        "mainnet-beta" | "mainnet" | "m" => "https://api.mainnet-beta.solana.com".to_string(),
        "localhost" | "l" => "http://localhost:8899".to_string(),
        other => other.to_string(),
    }
}

pub fn submit_settings(
    base: SubmitConfig,
    max_attempts: u32,
    confirm_timeout_secs: u64,
    poll_interval_ms: u64,
) -> SubmitConfig {
    SubmitConfig {
        confirm_timeout: Duration::from_secs(confirm_timeout_secs),
        poll_interval: Duration::from_millis(poll_interval_ms),
        retry: RetryPolicy::attempts(max_attempts),
        ..base
    }
}

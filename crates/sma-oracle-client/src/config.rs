//! Configuration for a bootstrap run.
//!
//! The client crate does not read environment variables or files. All
//! configuration is provided explicitly by the caller (the CLI fills it from
//! flags and environment).

use std::time::Duration;

use solana_program::pubkey::{Pubkey, MAX_SEED_LEN};
use solana_sdk::commitment_config::CommitmentLevel;

use crate::constants::{DEFAULT_PROGRAM_ID, SEED_ORACLE};
use crate::error::{BootstrapError, BootstrapResult, Stage};

/// How often a transient submission failure may be attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `1` disables retries.
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self { max_attempts: 1 }
    }

    pub fn attempts(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

/// Settings for the submit/confirm loop.
#[derive(Debug, Clone)]
pub struct SubmitConfig {
    pub commitment: CommitmentLevel,
    pub poll_interval: Duration,
    pub confirm_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            commitment: CommitmentLevel::Confirmed,
            poll_interval: Duration::from_millis(500),
            confirm_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

/// Full configuration of one bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Target program. `None` (or the all-zero key) means not configured.
    pub program_id: Option<Pubkey>,
    /// PDA seed; must match the program's `seeds = [...]` constraint.
    pub seed: Vec<u8>,
    pub submit: SubmitConfig,
    /// Look the state account up before sending and fail early if it exists.
    pub check_existing: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            program_id: Some(DEFAULT_PROGRAM_ID),
            seed: SEED_ORACLE.to_vec(),
            submit: SubmitConfig::default(),
            check_existing: true,
        }
    }
}

impl BootstrapConfig {
    /// The configured program id, or a configuration error if it is absent.
    pub fn require_program_id(&self) -> BootstrapResult<Pubkey> {
        match self.program_id {
            Some(id) if id != Pubkey::default() => Ok(id),
            _ => Err(BootstrapError::configuration(Stage::Config, "program id is missing")),
        }
    }
}

/// Validate a full configuration object.
pub fn validate_config(cfg: &BootstrapConfig) -> BootstrapResult<()> {
    cfg.require_program_id()?;

    if cfg.seed.is_empty() {
        return Err(BootstrapError::configuration(Stage::Config, "seed must not be empty"));
    }
    if cfg.seed.len() > MAX_SEED_LEN {
        return Err(BootstrapError::configuration(
            Stage::Config,
            format!("seed must be at most {MAX_SEED_LEN} bytes"),
        ));
    }

    validate_submit_config(&cfg.submit)
}

pub fn validate_submit_config(cfg: &SubmitConfig) -> BootstrapResult<()> {
    if cfg.poll_interval.is_zero() {
        return Err(BootstrapError::configuration(Stage::Config, "poll interval must be greater than zero"));
    }
    if cfg.confirm_timeout < cfg.poll_interval {
        return Err(BootstrapError::configuration(
            Stage::Config,
            "confirm timeout must not be shorter than the poll interval",
        ));
    }
    if cfg.retry.max_attempts == 0 {
        return Err(BootstrapError::configuration(Stage::Config, "max attempts must be at least 1"));
    }
    Ok(())
}

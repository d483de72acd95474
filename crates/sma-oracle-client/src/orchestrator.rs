//! Orchestration of the bootstrap run: derive, build, submit.
//!
//! The run stops at the first failing stage and reports exactly one
//! outcome. The derived address is attached to failures whenever it was
//! computed, so the caller can inspect on-chain state on its own.

use serde::Serialize;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use thiserror::Error;

use crate::config::{validate_config, BootstrapConfig};
use crate::error::{BootstrapError, BootstrapResult, Stage};
use crate::instruction::{build_initialize, InitializeAccounts};
use crate::network::{AccountSummary, LedgerNetwork};
use crate::pda::{derive_address, DerivedAddress};
use crate::submitter::TransactionSubmitter;

/// Successful initialization.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeReport {
    pub oracle_state: DerivedAddress,
    #[serde(serialize_with = "serialize_display")]
    pub signature: Signature,
    pub attempts: u32,
    #[serde(serialize_with = "serialize_commitment")]
    pub commitment: CommitmentLevel,
}

/// A failed run: the classified error plus whatever address was derived.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct BootstrapFailure {
    pub error: BootstrapError,
    pub oracle_state: Option<DerivedAddress>,
}

impl BootstrapFailure {
    fn at(oracle_state: Option<DerivedAddress>) -> impl FnOnce(BootstrapError) -> Self {
        move |error| Self { error, oracle_state }
    }
}

/// On-chain view of the oracle state account.
#[derive(Debug, Clone, Serialize)]
pub struct OracleStateStatus {
    pub oracle_state: DerivedAddress,
    pub account: Option<AccountSummary>,
    /// The account exists and is owned by the oracle program.
    pub initialized: bool,
}

fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

fn serialize_commitment<S: serde::Serializer>(level: &CommitmentLevel, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("{level:?}").to_lowercase())
}

pub struct Bootstrap<'a, N: LedgerNetwork + ?Sized> {
    config: BootstrapConfig,
    network: &'a N,
}

impl<'a, N: LedgerNetwork + ?Sized> Bootstrap<'a, N> {
    pub fn new(config: BootstrapConfig, network: &'a N) -> Self {
        Self { config, network }
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Derive the oracle state address. Needs no network access.
    pub fn derive(&self) -> BootstrapResult<DerivedAddress> {
        validate_config(&self.config)?;
        let program_id = self.config.require_program_id()?;
        derive_address(&[self.config.seed.as_slice()], &program_id)
    }

    /// Run derive → build → submit once.
    #[tracing::instrument(name = "initialize", skip_all)]
    pub async fn run(&self, authority: &dyn Signer) -> Result<InitializeReport, BootstrapFailure> {
        let oracle_state = self.derive().map_err(BootstrapFailure::at(None))?;
        tracing::info!(oracle_state = %oracle_state.address, bump = oracle_state.bump, "derived oracle state address");

        let fail = || BootstrapFailure::at(Some(oracle_state));
        let program_id = self.config.require_program_id().map_err(fail())?;

        let authority_key = authority
            .try_pubkey()
            .map_err(|e| BootstrapError::configuration(Stage::Config, format!("authority key unavailable: {e}")))
            .map_err(fail())?;

        let ix = build_initialize(&program_id, InitializeAccounts::new(oracle_state.address, authority_key))
            .map_err(fail())?;
        tracing::info!(authority = %authority_key, "built initialize instruction");

        if self.config.check_existing {
            self.ensure_uninitialized(&oracle_state.address).await.map_err(fail())?;
        }

        let submission = TransactionSubmitter::new(self.network, self.config.submit.clone())
            .with_landing_check(oracle_state.address, program_id)
            .submit(&[ix], authority)
            .await
            .map_err(fail())?;

        Ok(InitializeReport {
            oracle_state,
            signature: submission.signature,
            attempts: submission.attempts,
            commitment: self.config.submit.commitment,
        })
    }

    /// Derive the address and report what the cluster holds there.
    pub async fn inspect(&self) -> Result<OracleStateStatus, BootstrapFailure> {
        let oracle_state = self.derive().map_err(BootstrapFailure::at(None))?;
        let program_id = self.config.require_program_id().map_err(BootstrapFailure::at(Some(oracle_state)))?;

        let account = self
            .network
            .account_summary(&oracle_state.address)
            .await
            .map_err(|e| e.into_bootstrap(Stage::Preflight))
            .map_err(BootstrapFailure::at(Some(oracle_state)))?;

        let initialized = account.as_ref().is_some_and(|a| a.owner == program_id);
        Ok(OracleStateStatus { oracle_state, account, initialized })
    }

    async fn ensure_uninitialized(&self, address: &Pubkey) -> BootstrapResult<()> {
        let existing = self
            .network
            .account_summary(address)
            .await
            .map_err(|e| e.into_bootstrap(Stage::Preflight))?;

        match existing {
            None => Ok(()),
            Some(account) => {
                tracing::warn!(%address, owner = %account.owner, "oracle state account already exists");
                Err(BootstrapError::rejected(
                    Stage::Preflight,
                    format!(
                        "oracle state {address} already initialized (owner {}, {} bytes)",
                        account.owner, account.data_len
                    ),
                ))
            }
        }
    }
}

//! bootstrap_flow.rs
//!
//! End-to-end pipeline runs against the scripted in-memory cluster:
//! success, expired blockhash with retry, lagging status, confirmation
//! timeout, re-initialization, missing configuration and signing failures.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use common::MockNetwork;
use sma_oracle_client::{
    build_initialize, derive_oracle_state, Bootstrap, BootstrapConfig, BootstrapError, ErrorClass,
    InitializeAccounts, RetryPolicy, Stage, SubmitConfig, TransactionSubmitter, TransientKind,
    UnsignedTransaction, DEFAULT_PROGRAM_ID,
};
use solana_program::instruction::InstructionError;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::signer::SignerError;
use solana_sdk::transaction::TransactionError;

fn config() -> BootstrapConfig {
    BootstrapConfig::default()
}

/// Polls every 5ms and gives up after 20ms.
fn fast_config(max_attempts: u32) -> BootstrapConfig {
    let mut cfg = config();
    cfg.submit.poll_interval = Duration::from_millis(5);
    cfg.submit.confirm_timeout = Duration::from_millis(20);
    cfg.submit.retry = RetryPolicy::attempts(max_attempts);
    cfg
}

fn oracle_state() -> Pubkey {
    derive_oracle_state(&DEFAULT_PROGRAM_ID).unwrap().address
}

#[tokio::test]
async fn immediate_confirmation_reports_signature_and_address() {
    let network = MockNetwork::new();
    let authority = Keypair::new();

    let report = Bootstrap::new(config(), &network).run(&authority).await.unwrap();

    assert_ne!(report.signature, Signature::default());
    assert!(!report.signature.to_string().is_empty());
    assert_eq!(report.oracle_state.address, oracle_state());
    assert_eq!(report.attempts, 1);
    assert_eq!(network.sends(), 1);

    let account = network.account(&oracle_state()).expect("state account created");
    assert_eq!(account.owner, DEFAULT_PROGRAM_ID);
}

#[tokio::test]
async fn expired_blockhash_is_transient_and_fresh_retry_succeeds() {
    let network = MockNetwork::new().with_expired_blockhashes(1);
    let authority = Keypair::new();
    let bootstrap = Bootstrap::new(config(), &network);

    let failure = bootstrap.run(&authority).await.unwrap_err();
    assert_matches!(
        failure.error,
        BootstrapError::NetworkTransient { kind: TransientKind::BlockhashExpired, stage: Stage::Confirm, .. }
    );
    assert!(failure.error.is_retriable());
    assert_eq!(failure.oracle_state.map(|d| d.address), Some(oracle_state()));

    let report = bootstrap.run(&authority).await.unwrap();
    assert_eq!(report.oracle_state.address, oracle_state());
    assert_eq!(network.sends(), 2);
}

#[tokio::test]
async fn retry_policy_resubmits_with_fresh_blockhash() {
    let network = MockNetwork::new().with_expired_blockhashes(1);
    let authority = Keypair::new();
    let mut cfg = config();
    cfg.submit.retry = RetryPolicy::attempts(2);

    let report = Bootstrap::new(cfg, &network).run(&authority).await.unwrap();
    assert_eq!(report.attempts, 2);
    assert_eq!(network.sends(), 2);
}

#[tokio::test]
async fn unconfirmed_status_times_out_as_transient() {
    let network = MockNetwork::new().with_lagging_status();

    let failure = Bootstrap::new(fast_config(1), &network).run(&Keypair::new()).await.unwrap_err();

    assert_matches!(
        failure.error,
        BootstrapError::NetworkTransient { kind: TransientKind::Timeout, stage: Stage::Confirm, .. }
    );
    assert!(failure.error.is_retriable());
    assert_eq!(network.sends(), 1);
}

#[tokio::test]
async fn landed_attempt_with_lagging_status_is_not_resent() {
    let network = MockNetwork::new().with_lagging_status();

    let report = Bootstrap::new(fast_config(2), &network).run(&Keypair::new()).await.unwrap();

    assert_eq!(report.oracle_state.address, oracle_state());
    assert_ne!(report.signature, Signature::default());
    assert_eq!(report.attempts, 1);
    assert_eq!(network.sends(), 1);
    assert_eq!(network.account(&oracle_state()).map(|a| a.owner), Some(DEFAULT_PROGRAM_ID));
}

#[tokio::test]
async fn failure_reported_at_confirmation_is_rejected_without_retry() {
    let network = MockNetwork::new()
        .with_confirm_failure(TransactionError::InstructionError(0, InstructionError::Custom(6000)));

    let failure = Bootstrap::new(fast_config(3), &network).run(&Keypair::new()).await.unwrap_err();

    assert_matches!(failure.error, BootstrapError::OnChainRejected { stage: Stage::Confirm, .. });
    assert!(failure.error.to_string().contains("instruction 0 failed"));
    assert_eq!(failure.oracle_state.map(|d| d.address), Some(oracle_state()));
    assert_eq!(network.sends(), 1);
}

#[tokio::test]
async fn unreachable_network_is_transient() {
    let network = MockNetwork::new().with_unreachable_fetches(1);
    let authority = Keypair::new();

    let failure = Bootstrap::new(config(), &network).run(&authority).await.unwrap_err();
    assert_matches!(
        failure.error,
        BootstrapError::NetworkTransient { kind: TransientKind::Unreachable, stage: Stage::FetchBlockhash, .. }
    );
    assert_eq!(network.sends(), 0);
}

#[tokio::test]
async fn already_initialized_account_is_rejected_in_preflight() {
    let network = MockNetwork::new().with_account(oracle_state(), DEFAULT_PROGRAM_ID);
    let authority = Keypair::new();
    let mut cfg = config();
    cfg.submit.retry = RetryPolicy::attempts(3);

    let failure = Bootstrap::new(cfg, &network).run(&authority).await.unwrap_err();
    assert_matches!(failure.error, BootstrapError::OnChainRejected { stage: Stage::Preflight, .. });
    assert_eq!(network.sends(), 0);
}

#[tokio::test]
async fn already_initialized_account_is_rejected_on_chain_without_retry() {
    let network = MockNetwork::new();
    let authority = Keypair::new();
    let mut cfg = config();
    cfg.check_existing = false;
    cfg.submit.retry = RetryPolicy::attempts(3);
    let bootstrap = Bootstrap::new(cfg, &network);

    bootstrap.run(&authority).await.unwrap();
    let failure = bootstrap.run(&authority).await.unwrap_err();

    assert_eq!(failure.error.class(), ErrorClass::OnChainRejected);
    assert_eq!(failure.error.stage(), Stage::Send);
    assert_eq!(failure.oracle_state.map(|d| d.address), Some(oracle_state()));
    // One send for the first run, exactly one for the rejected second run.
    assert_eq!(network.sends(), 2);
}

#[tokio::test]
async fn resending_a_landed_transaction_is_rejected() {
    let network = MockNetwork::new();
    let authority = Keypair::new();
    let ix = build_initialize(&DEFAULT_PROGRAM_ID, InitializeAccounts::new(oracle_state(), authority.pubkey())).unwrap();

    let blockhash = {
        use sma_oracle_client::LedgerNetwork;
        network.latest_blockhash().await.unwrap()
    };
    let signed = UnsignedTransaction::build(&[ix], &authority.pubkey(), blockhash)
        .unwrap()
        .sign(&authority)
        .unwrap();

    let submitter = TransactionSubmitter::new(&network, SubmitConfig::default());
    let signature = submitter.send_signed(&signed).await.unwrap();
    assert_eq!(signature, signed.signature());

    let err = submitter.send_signed(&signed).await.unwrap_err();
    assert_matches!(err, BootstrapError::OnChainRejected { stage: Stage::Send, .. });
}

#[tokio::test]
async fn missing_program_id_fails_before_any_network_call() {
    let network = MockNetwork::new();
    let authority = Keypair::new();
    let cfg = BootstrapConfig { program_id: None, ..config() };

    let failure = Bootstrap::new(cfg, &network).run(&authority).await.unwrap_err();

    assert_matches!(failure.error, BootstrapError::Configuration { stage: Stage::Config, .. });
    assert!(failure.oracle_state.is_none());
    assert_eq!(network.calls(), 0);
}

#[tokio::test]
async fn invalid_submit_settings_fail_before_any_network_call() {
    let network = MockNetwork::new();
    let mut cfg = config();
    cfg.submit.retry = RetryPolicy::attempts(0);

    let failure = Bootstrap::new(cfg, &network).run(&Keypair::new()).await.unwrap_err();
    assert_eq!(failure.error.class(), ErrorClass::Configuration);
    assert_eq!(network.calls(), 0);
}

/// Signer whose signatures never verify.
struct BrokenSigner(Pubkey);

impl Signer for BrokenSigner {
    fn try_pubkey(&self) -> Result<Pubkey, SignerError> {
        Ok(self.0)
    }

    fn try_sign_message(&self, _message: &[u8]) -> Result<Signature, SignerError> {
        Ok(Signature::default())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn bad_signature_is_fatal_and_never_sent() {
    let network = MockNetwork::new();
    let mut cfg = config();
    cfg.submit.retry = RetryPolicy::attempts(3);
    let signer = BrokenSigner(Keypair::new().pubkey());

    let failure = Bootstrap::new(cfg, &network).run(&signer).await.unwrap_err();

    assert_matches!(failure.error, BootstrapError::SignatureInvalid { stage: Stage::Sign, .. });
    assert!(!failure.error.is_retriable());
    assert_eq!(network.sends(), 0);
}

#[tokio::test]
async fn inspect_reports_initialized_state() {
    let network = MockNetwork::new();
    let bootstrap = Bootstrap::new(config(), &network);

    let before = bootstrap.inspect().await.unwrap();
    assert!(!before.initialized);
    assert!(before.account.is_none());

    bootstrap.run(&Keypair::new()).await.unwrap();

    let after = bootstrap.inspect().await.unwrap();
    assert!(after.initialized);
    assert_eq!(after.oracle_state, before.oracle_state);
}

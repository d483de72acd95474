//! Network capability used by the submitter.
//!
//! The pipeline only needs a handful of RPC calls, so it talks to the
//! cluster through [`LedgerNetwork`]. [`RpcNetwork`] is the production
//! implementation over the nonblocking `RpcClient`; tests substitute a
//! scripted double.

use async_trait::async_trait;
use serde::Serialize;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcError;
use solana_program::hash::Hash;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};
use thiserror::Error;

use crate::error::{BootstrapError, Stage, TransientKind};

/// JSON-RPC server error codes the classifier cares about.
const RPC_SIGNATURE_VERIFICATION_FAILURE: i64 = -32003;
const RPC_NODE_UNHEALTHY: i64 = -32005;

/// Transport-level failure reported by a [`LedgerNetwork`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("network unreachable: {0}")]
    Unreachable(String),

    #[error("blockhash not found")]
    BlockhashNotFound,

    #[error("transaction failed: {0}")]
    Transaction(TransactionError),

    #[error("signature rejected: {0}")]
    Signature(String),

    #[error("rpc error: {0}")]
    Rejected(String),
}

impl NetworkError {
    /// Lift into the pipeline taxonomy, tagging the stage it happened in.
    pub fn into_bootstrap(self, stage: Stage) -> BootstrapError {
        match self {
            Self::Unreachable(msg) => BootstrapError::transient(stage, TransientKind::Unreachable, msg),
            Self::BlockhashNotFound => {
                BootstrapError::transient(stage, TransientKind::BlockhashExpired, "blockhash not found")
            }
            Self::Transaction(err) => classify_transaction_error(stage, err),
            Self::Signature(msg) => BootstrapError::signature(stage, msg),
            Self::Rejected(msg) => BootstrapError::rejected(stage, msg),
        }
    }
}

/// Map an executed (or simulated) transaction failure onto the taxonomy.
pub fn classify_transaction_error(stage: Stage, err: TransactionError) -> BootstrapError {
    match err {
        TransactionError::BlockhashNotFound => {
            BootstrapError::transient(stage, TransientKind::BlockhashExpired, err.to_string())
        }
        TransactionError::SignatureFailure | TransactionError::MissingSignatureForFee => {
            BootstrapError::signature(stage, err.to_string())
        }
        TransactionError::InstructionError(index, ref inner) => {
            BootstrapError::rejected(stage, format!("instruction {index} failed: {inner}"))
        }
        other => BootstrapError::rejected(stage, other.to_string()),
    }
}

/// Confirmation state of a sent transaction at a commitment level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not yet visible at the requested commitment.
    Pending,
    Confirmed,
    Failed(TransactionError),
}

/// What the cluster knows about an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    #[serde(serialize_with = "serialize_pubkey")]
    pub owner: Pubkey,
    pub lamports: u64,
    pub data_len: usize,
    pub executable: bool,
}

fn serialize_pubkey<S: serde::Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(key)
}

#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash, NetworkError>;

    async fn is_blockhash_valid(&self, blockhash: &Hash, commitment: CommitmentLevel) -> Result<bool, NetworkError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, NetworkError>;

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentLevel,
    ) -> Result<ConfirmationStatus, NetworkError>;

    async fn account_summary(&self, address: &Pubkey) -> Result<Option<AccountSummary>, NetworkError>;
}

/// [`LedgerNetwork`] backed by a JSON-RPC endpoint.
pub struct RpcNetwork {
    rpc: RpcClient,
}

impl RpcNetwork {
    pub fn new(rpc_url: &str, commitment: CommitmentLevel) -> Self {
        Self { rpc: RpcClient::new_with_commitment(rpc_url.to_string(), CommitmentConfig { commitment }) }
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait]
impl LedgerNetwork for RpcNetwork {
    async fn latest_blockhash(&self) -> Result<Hash, NetworkError> {
        self.rpc.get_latest_blockhash().await.map_err(|e| classify_client_error(&e))
    }

    async fn is_blockhash_valid(&self, blockhash: &Hash, commitment: CommitmentLevel) -> Result<bool, NetworkError> {
        self.rpc
            .is_blockhash_valid(blockhash, CommitmentConfig { commitment })
            .await
            .map_err(|e| classify_client_error(&e))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, NetworkError> {
        self.rpc.send_transaction(tx).await.map_err(|e| classify_client_error(&e))
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        commitment: CommitmentLevel,
    ) -> Result<ConfirmationStatus, NetworkError> {
        let status = self
            .rpc
            .get_signature_status_with_commitment(signature, CommitmentConfig { commitment })
            .await
            .map_err(|e| classify_client_error(&e))?;

        Ok(match status {
            None => ConfirmationStatus::Pending,
            Some(Ok(())) => ConfirmationStatus::Confirmed,
            Some(Err(err)) => ConfirmationStatus::Failed(err),
        })
    }

    async fn account_summary(&self, address: &Pubkey) -> Result<Option<AccountSummary>, NetworkError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await
            .map_err(|e| classify_client_error(&e))?;

        Ok(response.value.map(|account| AccountSummary {
            owner: account.owner,
            lamports: account.lamports,
            data_len: account.data.len(),
            executable: account.executable,
        }))
    }
}

/// Classify an RPC client failure.
pub fn classify_client_error(err: &ClientError) -> NetworkError {
    // Preflight simulation failures carry the transaction error inside the
    // RPC response; prefer it over the generic response text.
    if let Some(tx_err) = err.get_transaction_error() {
        return match tx_err {
            TransactionError::BlockhashNotFound => NetworkError::BlockhashNotFound,
            other => NetworkError::Transaction(other),
        };
    }

    match err.kind() {
        ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_) => NetworkError::Unreachable(err.to_string()),
        ClientErrorKind::SigningError(e) => NetworkError::Signature(e.to_string()),
        ClientErrorKind::RpcError(RpcError::RpcRequestError(msg)) => NetworkError::Unreachable(msg.clone()),
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, message, .. }) => match *code {
            RPC_SIGNATURE_VERIFICATION_FAILURE => NetworkError::Signature(message.clone()),
            RPC_NODE_UNHEALTHY => NetworkError::Unreachable(message.clone()),
            _ => NetworkError::Rejected(message.clone()),
        },
        _ => NetworkError::Rejected(err.to_string()),
    }
}

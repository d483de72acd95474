//! Error taxonomy for the bootstrap pipeline.
//!
//! Every failure carries the [`Stage`] it came from so the caller can tell
//! which step stopped the run. [`ErrorClass`] is the coarse classification
//! used for retry decisions and for the process outcome.

use std::fmt;

use serde::Serialize;
use solana_program::pubkey::Pubkey;
use thiserror::Error;

/// Pipeline step that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Config,
    Derive,
    BuildInstruction,
    Preflight,
    FetchBlockhash,
    Sign,
    Send,
    Confirm,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Config => "config",
            Self::Derive => "derive",
            Self::BuildInstruction => "build-instruction",
            Self::Preflight => "preflight",
            Self::FetchBlockhash => "fetch-blockhash",
            Self::Sign => "sign",
            Self::Send => "send",
            Self::Confirm => "confirm",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of transient network failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransientKind {
    /// Connection refused, HTTP failure, RPC node unavailable.
    Unreachable,
    /// The recent blockhash expired before the transaction landed.
    BlockhashExpired,
    /// Confirmation did not arrive within the configured timeout.
    Timeout,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unreachable => "network unreachable",
            Self::BlockhashExpired => "blockhash expired",
            Self::Timeout => "confirmation timeout",
        })
    }
}

/// Coarse failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    Configuration,
    DerivationExhausted,
    NetworkTransient,
    OnChainRejected,
    SignatureInvalid,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::DerivationExhausted => "derivation-exhausted",
            Self::NetworkTransient => "network-transient",
            Self::OnChainRejected => "on-chain-rejected",
            Self::SignatureInvalid => "signature-invalid",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapError {
    #[error("[{stage}] configuration error: {reason}")]
    Configuration { stage: Stage, reason: String },

    #[error("[derive] no off-curve program address exists for program {program_id}")]
    DerivationExhausted { program_id: Pubkey },

    #[error("[{stage}] {kind}: {message}")]
    NetworkTransient {
        stage: Stage,
        kind: TransientKind,
        message: String,
    },

    #[error("[{stage}] rejected on-chain: {message}")]
    OnChainRejected { stage: Stage, message: String },

    #[error("[{stage}] invalid signature: {reason}")]
    SignatureInvalid { stage: Stage, reason: String },
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

impl BootstrapError {
    pub fn configuration(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Configuration { stage, reason: reason.into() }
    }

    pub fn transient(stage: Stage, kind: TransientKind, message: impl Into<String>) -> Self {
        Self::NetworkTransient { stage, kind, message: message.into() }
    }

    pub fn rejected(stage: Stage, message: impl Into<String>) -> Self {
        Self::OnChainRejected { stage, message: message.into() }
    }

    pub fn signature(stage: Stage, reason: impl Into<String>) -> Self {
        Self::SignatureInvalid { stage, reason: reason.into() }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Configuration { stage, .. }
            | Self::NetworkTransient { stage, .. }
            | Self::OnChainRejected { stage, .. }
            | Self::SignatureInvalid { stage, .. } => *stage,
            Self::DerivationExhausted { .. } => Stage::Derive,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Configuration { .. } => ErrorClass::Configuration,
            Self::DerivationExhausted { .. } => ErrorClass::DerivationExhausted,
            Self::NetworkTransient { .. } => ErrorClass::NetworkTransient,
            Self::OnChainRejected { .. } => ErrorClass::OnChainRejected,
            Self::SignatureInvalid { .. } => ErrorClass::SignatureInvalid,
        }
    }

    /// Only transient network failures are safe to retry, and only with a
    /// freshly fetched blockhash.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::NetworkTransient { .. })
    }
}

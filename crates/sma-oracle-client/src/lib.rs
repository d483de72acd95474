//! sma-oracle-client
//!
//! Bootstrap client for the SMA oracle on-chain program.
//!
//! It includes:
//! - PDA derivation for the oracle state account
//! - the `initialize` instruction builder
//! - a transaction submitter with classified failures
//! - an orchestrator that runs the three once and reports a single outcome
//!
//! Network access goes through the [`LedgerNetwork`] trait and signing
//! through `solana_sdk::signer::Signer`, so both can be replaced in tests.

pub mod config;
pub mod constants;
pub mod error;
pub mod instruction;
pub mod network;
pub mod orchestrator;
pub mod pda;
pub mod submitter;

pub use config::{validate_config, BootstrapConfig, RetryPolicy, SubmitConfig};
pub use constants::*;
pub use error::{BootstrapError, BootstrapResult, ErrorClass, Stage, TransientKind};
pub use instruction::{build_initialize, discriminator, InitializeAccounts};
pub use network::{AccountSummary, ConfirmationStatus, LedgerNetwork, NetworkError, RpcNetwork};
pub use orchestrator::{Bootstrap, BootstrapFailure, InitializeReport, OracleStateStatus};
pub use pda::{derive_address, derive_oracle_state, is_program_address, DerivedAddress};
pub use submitter::{LandingCheck, SignedTransaction, Submission, TransactionSubmitter, UnsignedTransaction};

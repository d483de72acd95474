//! Instruction builders for the SMA oracle program.
//!
//! The program is an Anchor program, so instruction data starts with the
//! 8-byte method discriminator `sha256("global:<name>")[..8]`.

use sha2::{Digest, Sha256};
use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_sdk_ids::system_program;

use crate::constants::{ANCHOR_IX_NAMESPACE, IX_INITIALIZE};
use crate::error::{BootstrapError, BootstrapResult, Stage};

/// Accounts referenced by `initialize`, in program order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitializeAccounts {
    pub oracle_state: Pubkey,
    pub authority: Pubkey,
    pub system_program: Pubkey,
}

impl InitializeAccounts {
    pub fn new(oracle_state: Pubkey, authority: Pubkey) -> Self {
        Self { oracle_state, authority, system_program: system_program::ID }
    }

    fn validate(&self) -> BootstrapResult<()> {
        let missing = |what: &str| BootstrapError::configuration(Stage::BuildInstruction, format!("{what} is missing"));

        if self.oracle_state == Pubkey::default() {
            return Err(missing("oracle state address"));
        }
        if self.authority == Pubkey::default() {
            return Err(missing("authority"));
        }
        if self.system_program != system_program::ID {
            return Err(BootstrapError::configuration(
                Stage::BuildInstruction,
                format!("unexpected system program {}", self.system_program),
            ));
        }
        if self.oracle_state == self.authority {
            return Err(BootstrapError::configuration(
                Stage::BuildInstruction,
                "oracle state and authority must be distinct accounts",
            ));
        }
        Ok(())
    }
}

/// Anchor discriminator for a method name.
pub fn discriminator(name: &str) -> [u8; 8] {
    let mut hasher = Sha256::new();
    hasher.update(ANCHOR_IX_NAMESPACE.as_bytes());
    hasher.update(b":");
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();

    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Build the `initialize` instruction.
///
/// Pure data assembly; the inputs are checked before anything is returned.
pub fn build_initialize(program_id: &Pubkey, accounts: InitializeAccounts) -> BootstrapResult<Instruction> {
    if *program_id == Pubkey::default() {
        return Err(BootstrapError::configuration(Stage::BuildInstruction, "program id is missing"));
    }
    accounts.validate()?;

    let ix = Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(accounts.oracle_state, false),
            // Pays rent for the new state account.
            AccountMeta::new(accounts.authority, true),
            AccountMeta::new_readonly(accounts.system_program, false),
        ],
        data: discriminator(IX_INITIALIZE).to_vec(),
    };
    tracing::debug!(program = %ix.program_id, accounts = ix.accounts.len(), "built initialize instruction");
    Ok(ix)
}

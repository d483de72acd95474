//! PDA derivation for the SMA oracle program.
//!
//! The derivation walks the bump byte down from 255 and accepts the first
//! candidate that is not an ed25519 point, matching what the on-chain
//! program does when it validates `seeds = [b"oracle"], bump`.

use serde::Serialize;
use solana_program::pubkey::{Pubkey, PubkeyError, MAX_SEEDS, MAX_SEED_LEN};

use crate::constants::SEED_ORACLE;
use crate::error::{BootstrapError, BootstrapResult, Stage};

/// A program-owned address together with the bump that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedAddress {
    #[serde(serialize_with = "serialize_pubkey")]
    pub address: Pubkey,
    pub bump: u8,
}

impl DerivedAddress {
    pub fn as_tuple(&self) -> (Pubkey, u8) {
        (self.address, self.bump)
    }
}

fn serialize_pubkey<S: serde::Serializer>(key: &Pubkey, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(key)
}

/// Derive the oracle state PDA.
pub fn derive_oracle_state(program_id: &Pubkey) -> BootstrapResult<DerivedAddress> {
    derive_address(&[SEED_ORACLE], program_id)
}

/// Derive a program address for arbitrary seeds.
///
/// The bump is appended as the last seed. Fails with `DerivationExhausted`
/// if every bump lands on the curve.
pub fn derive_address(seeds: &[&[u8]], program_id: &Pubkey) -> BootstrapResult<DerivedAddress> {
    validate_seeds(seeds)?;
    if *program_id == Pubkey::default() {
        return Err(BootstrapError::configuration(Stage::Derive, "program id is missing"));
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut candidate: Vec<&[u8]> = Vec::with_capacity(seeds.len() + 1);
        candidate.extend_from_slice(seeds);
        candidate.push(&bump_seed);

        match Pubkey::create_program_address(&candidate, program_id) {
            Ok(address) => {
                tracing::debug!(%address, bump, "derived program address");
                return Ok(DerivedAddress { address, bump });
            }
            // On-curve candidate, try the next bump.
            Err(PubkeyError::InvalidSeeds) => continue,
            Err(e) => {
                return Err(BootstrapError::configuration(Stage::Derive, format!("invalid seeds: {e}")));
            }
        }
    }

    Err(BootstrapError::DerivationExhausted { program_id: *program_id })
}

/// True when no private key can exist for `key`.
pub fn is_program_address(key: &Pubkey) -> bool {
    !key.is_on_curve()
}

fn validate_seeds(seeds: &[&[u8]]) -> BootstrapResult<()> {
    // One slot is reserved for the bump.
    if seeds.len() >= MAX_SEEDS {
        return Err(BootstrapError::configuration(
            Stage::Derive,
            format!("too many seeds: {} (max {})", seeds.len(), MAX_SEEDS - 1),
        ));
    }
    if seeds.iter().all(|s| s.is_empty()) {
        return Err(BootstrapError::configuration(Stage::Derive, "seed must not be empty"));
    }
    if let Some(long) = seeds.iter().find(|s| s.len() > MAX_SEED_LEN) {
        return Err(BootstrapError::configuration(
            Stage::Derive,
            format!("seed of {} bytes exceeds {MAX_SEED_LEN}", long.len()),
        ));
    }
    Ok(())
}

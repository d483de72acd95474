//! Constants shared between the on-chain program and clients.
//!
//! Keep these stable because they affect PDA derivation and instruction
//! decoding on-chain.

use solana_program::pubkey::Pubkey;

/// PDA seed for the oracle state account.
pub const SEED_ORACLE: &[u8] = b"oracle";

/// Deployed SMA oracle program id.
pub const DEFAULT_PROGRAM_ID: Pubkey =
    solana_program::pubkey!("G7i3UNUsFpm3NSAvY2wWtVqSM3HQhoxUJ5NyWSPZQDoL");

/// Anchor method name of the state-initializing instruction.
pub const IX_INITIALIZE: &str = "initialize";

/// Namespace Anchor prepends to method names before hashing.
pub const ANCHOR_IX_NAMESPACE: &str = "global";

/// Cluster used when nothing else is configured.
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Keypair used when nothing else is configured.
pub const DEFAULT_KEYPAIR_PATH: &str = "~/.config/solana/id.json";

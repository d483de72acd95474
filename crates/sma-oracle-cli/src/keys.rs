use std::path::PathBuf;

use sma_oracle_client::{BootstrapError, BootstrapResult, Stage};
use solana_sdk::signature::{read_keypair_file, Keypair};

/// Load the authority keypair from a JSON keypair file (`~` is expanded).
///
/// A missing or unreadable key is a configuration problem, reported before
/// anything touches the network.
pub fn load_authority(path: &str) -> BootstrapResult<Keypair> {
    let expanded = PathBuf::from(shellexpand::tilde(path).into_owned());
    if !expanded.exists() {
        return Err(BootstrapError::configuration(
            Stage::Config,
            format!("authority keypair not found at {}", expanded.display()),
        ));
    }
    read_keypair_file(&expanded).map_err(|e| {
        BootstrapError::configuration(
            Stage::Config,
            format!("failed to read authority keypair {}: {e}", expanded.display()),
        )
    })
}

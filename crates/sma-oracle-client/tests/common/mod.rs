//! Scripted in-memory cluster for pipeline tests.
//!
//! A transaction lands when its blockhash is still valid; landing an
//! `initialize` creates the state account, so a second attempt is rejected
//! the way the real program rejects it.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use sma_oracle_client::{AccountSummary, ConfirmationStatus, LedgerNetwork, NetworkError};
use solana_program::hash::Hash;
use solana_program::instruction::InstructionError;
use solana_program::pubkey::Pubkey;
use solana_sdk::commitment_config::CommitmentLevel;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, TransactionError};

#[derive(Default)]
pub struct MockNetwork {
    calls: AtomicUsize,
    sends: AtomicUsize,
    /// The first N blockhashes handed out are already expired.
    expired_blockhashes: usize,
    /// The first N blockhash fetches fail as unreachable.
    unreachable_fetches: usize,
    /// Transactions execute as soon as they are sent, but their status
    /// never leaves `Pending`.
    lagging_status: bool,
    /// Every sent transaction reports this failure when its status is
    /// checked.
    confirm_failure: Option<TransactionError>,
    issued: Mutex<Vec<Hash>>,
    fetches: AtomicUsize,
    /// Sent transactions by signature, with the state account they create.
    pending: Mutex<HashMap<Signature, (Hash, Pubkey, Pubkey)>>,
    seen: Mutex<HashSet<Signature>>,
    accounts: Mutex<HashMap<Pubkey, AccountSummary>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_expired_blockhashes(mut self, n: usize) -> Self {
        self.expired_blockhashes = n;
        self
    }

    pub fn with_unreachable_fetches(mut self, n: usize) -> Self {
        self.unreachable_fetches = n;
        self
    }

    pub fn with_lagging_status(mut self) -> Self {
        self.lagging_status = true;
        self
    }

    pub fn with_confirm_failure(mut self, err: TransactionError) -> Self {
        self.confirm_failure = Some(err);
        self
    }

    pub fn with_account(self, address: Pubkey, owner: Pubkey) -> Self {
        self.accounts.lock().unwrap().insert(
            address,
            AccountSummary { owner, lamports: 1_461_600, data_len: 24, executable: false },
        );
        self
    }

    /// Every call into the capability, of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn account(&self, address: &Pubkey) -> Option<AccountSummary> {
        self.accounts.lock().unwrap().get(address).cloned()
    }

    fn create_state(&self, state: Pubkey, program_id: Pubkey) {
        self.accounts.lock().unwrap().entry(state).or_insert(AccountSummary {
            owner: program_id,
            lamports: 1_461_600,
            data_len: 24,
            executable: false,
        });
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn blockhash_index(&self, blockhash: &Hash) -> Option<usize> {
        self.issued.lock().unwrap().iter().position(|h| h == blockhash)
    }

    fn blockhash_valid(&self, blockhash: &Hash) -> bool {
        matches!(self.blockhash_index(blockhash), Some(i) if i >= self.expired_blockhashes)
    }
}

/// (program id, state account) targeted by the first instruction.
fn initialize_target(tx: &Transaction) -> (Pubkey, Pubkey) {
    let ix = &tx.message.instructions[0];
    let keys = &tx.message.account_keys;
    (keys[ix.program_id_index as usize], keys[ix.accounts[0] as usize])
}

#[async_trait]
impl LedgerNetwork for MockNetwork {
    async fn latest_blockhash(&self) -> Result<Hash, NetworkError> {
        self.tick();
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if n < self.unreachable_fetches {
            return Err(NetworkError::Unreachable("connection refused".to_string()));
        }
        let hash = Hash::new_unique();
        self.issued.lock().unwrap().push(hash);
        Ok(hash)
    }

    async fn is_blockhash_valid(&self, blockhash: &Hash, _commitment: CommitmentLevel) -> Result<bool, NetworkError> {
        self.tick();
        Ok(self.blockhash_valid(blockhash))
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, NetworkError> {
        self.tick();
        self.sends.fetch_add(1, Ordering::SeqCst);

        let signature = tx.signatures[0];
        if !self.seen.lock().unwrap().insert(signature) {
            return Err(NetworkError::Transaction(TransactionError::AlreadyProcessed));
        }
        if self.blockhash_index(&tx.message.recent_blockhash).is_none() {
            return Err(NetworkError::BlockhashNotFound);
        }

        let (program_id, state) = initialize_target(tx);
        if self.accounts.lock().unwrap().contains_key(&state) {
            // System program: account already in use.
            return Err(NetworkError::Transaction(TransactionError::InstructionError(
                0,
                InstructionError::Custom(0),
            )));
        }

        self.pending
            .lock()
            .unwrap()
            .insert(signature, (tx.message.recent_blockhash, program_id, state));
        if self.lagging_status {
            self.create_state(state, program_id);
        }
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _commitment: CommitmentLevel,
    ) -> Result<ConfirmationStatus, NetworkError> {
        self.tick();
        let Some((blockhash, program_id, state)) = self.pending.lock().unwrap().get(signature).copied() else {
            return Ok(ConfirmationStatus::Pending);
        };
        if let Some(err) = &self.confirm_failure {
            return Ok(ConfirmationStatus::Failed(err.clone()));
        }
        if self.lagging_status || !self.blockhash_valid(&blockhash) {
            return Ok(ConfirmationStatus::Pending);
        }

        self.create_state(state, program_id);
        Ok(ConfirmationStatus::Confirmed)
    }

    async fn account_summary(&self, address: &Pubkey) -> Result<Option<AccountSummary>, NetworkError> {
        self.tick();
        Ok(self.account(address))
    }
}

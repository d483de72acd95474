//! Transaction building, signing, submission and confirmation.
//!
//! A transaction moves through `UnsignedTransaction` (built against a fresh
//! blockhash) to `SignedTransaction` (signing consumes the unsigned value) and
//! is then sent and polled until it reaches the requested commitment, fails,
//! or its blockhash expires.

use serde::Serialize;
use solana_program::hash::Hash;
use solana_program::instruction::Instruction;
use solana_program::message::Message;
use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::Transaction;
use tokio::time::{sleep, Instant};

use crate::config::SubmitConfig;
use crate::error::{BootstrapError, BootstrapResult, Stage, TransientKind};
use crate::network::{classify_transaction_error, ConfirmationStatus, LedgerNetwork};

/// A transaction assembled against a recent blockhash, not yet signed.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    tx: Transaction,
    blockhash: Hash,
}

impl UnsignedTransaction {
    /// Assemble `instructions` in order, paid for by `payer`.
    pub fn build(instructions: &[Instruction], payer: &Pubkey, blockhash: Hash) -> BootstrapResult<Self> {
        if instructions.is_empty() {
            return Err(BootstrapError::configuration(
                Stage::BuildInstruction,
                "transaction needs at least one instruction",
            ));
        }
        let message = Message::new_with_blockhash(instructions, Some(payer), &blockhash);
        Ok(Self { tx: Transaction::new_unsigned(message), blockhash })
    }

    pub fn message(&self) -> &Message {
        &self.tx.message
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// Sign with the fee payer. Fails if `signer` is not the payer the
    /// transaction was built for, or if the resulting signature does not verify.
    pub fn sign(self, signer: &dyn Signer) -> BootstrapResult<SignedTransaction> {
        let payer = self.tx.message.account_keys.first().copied().unwrap_or_default();
        let signer_key = signer
            .try_pubkey()
            .map_err(|e| BootstrapError::signature(Stage::Sign, format!("signer unavailable: {e}")))?;
        if signer_key != payer {
            return Err(BootstrapError::signature(
                Stage::Sign,
                format!("signer {signer_key} does not match fee payer {payer}"),
            ));
        }

        let mut tx = self.tx;
        let signers: Vec<&dyn Signer> = vec![signer];
        tx.try_sign(&signers, self.blockhash)
            .map_err(|e| BootstrapError::signature(Stage::Sign, e.to_string()))?;
        tx.verify()
            .map_err(|e| BootstrapError::signature(Stage::Sign, e.to_string()))?;

        Ok(SignedTransaction { tx, blockhash: self.blockhash })
    }
}

/// A fully signed transaction. Immutable; a new blockhash means building and
/// signing again.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    tx: Transaction,
    blockhash: Hash,
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.tx
    }

    pub fn blockhash(&self) -> Hash {
        self.blockhash
    }

    /// The fee payer's signature, which is also the transaction id.
    pub fn signature(&self) -> Signature {
        self.tx.signatures.first().copied().unwrap_or_default()
    }
}

/// Result of a confirmed submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Submission {
    #[serde(serialize_with = "serialize_display")]
    pub signature: Signature,
    #[serde(serialize_with = "serialize_display")]
    pub blockhash: Hash,
    pub attempts: u32,
}

fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

pub struct TransactionSubmitter<'a, N: LedgerNetwork + ?Sized> {
    network: &'a N,
    config: SubmitConfig,
    landing: Option<LandingCheck>,
}

/// An account whose existence, owned by `owner`, proves an earlier attempt
/// already landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandingCheck {
    pub account: Pubkey,
    pub owner: Pubkey,
}

impl<'a, N: LedgerNetwork + ?Sized> TransactionSubmitter<'a, N> {
    pub fn new(network: &'a N, config: SubmitConfig) -> Self {
        Self { network, config, landing: None }
    }

    /// Before a retry, look `account` up and stop with success if it is
    /// already owned by `owner`.
    pub fn with_landing_check(mut self, account: Pubkey, owner: Pubkey) -> Self {
        self.landing = Some(LandingCheck { account, owner });
        self
    }

    /// Build, sign, send and confirm `instructions`.
    ///
    /// Transient failures are retried up to the retry policy, each attempt
    /// with a fresh blockhash and a fresh signature. A resend is not
    /// idempotent, so before retrying (and after any failure of a retry)
    /// the earlier signatures and the landing check are consulted; a landed
    /// earlier attempt is reported as success. Everything else is returned
    /// on first occurrence.
    pub async fn submit(&self, instructions: &[Instruction], signer: &dyn Signer) -> BootstrapResult<Submission> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut sent: Vec<(Signature, Hash)> = Vec::new();
        let mut attempt = 1;

        loop {
            let err = match self.submit_once(instructions, signer, &mut sent).await {
                Ok((signature, blockhash)) => {
                    tracing::info!(%signature, attempt, "transaction confirmed");
                    return Ok(Submission { signature, blockhash, attempts: attempt });
                }
                Err(err) => err,
            };

            let will_retry = err.is_retriable() && attempt < max_attempts;
            if !sent.is_empty() && (will_retry || attempt > 1) {
                if let Some((signature, blockhash)) = self.find_landed(&sent).await {
                    tracing::warn!(%signature, attempt, error = %err, "earlier attempt already landed");
                    return Ok(Submission { signature, blockhash, attempts: attempt });
                }
            }

            if will_retry {
                tracing::warn!(attempt, max_attempts, error = %err, "transient failure, retrying with a fresh blockhash");
                attempt += 1;
                continue;
            }
            tracing::error!(attempt, class = err.class().as_str(), error = %err, "submission failed");
            return Err(err);
        }
    }

    async fn submit_once(
        &self,
        instructions: &[Instruction],
        signer: &dyn Signer,
        sent: &mut Vec<(Signature, Hash)>,
    ) -> BootstrapResult<(Signature, Hash)> {
        let blockhash = self
            .network
            .latest_blockhash()
            .await
            .map_err(|e| e.into_bootstrap(Stage::FetchBlockhash))?;
        tracing::debug!(%blockhash, "fetched recent blockhash");

        let payer = signer
            .try_pubkey()
            .map_err(|e| BootstrapError::signature(Stage::Sign, format!("signer unavailable: {e}")))?;
        let signed = UnsignedTransaction::build(instructions, &payer, blockhash)?.sign(signer)?;

        // Recorded before sending: a send that errors locally may still
        // have reached the cluster.
        sent.push((signed.signature(), blockhash));
        let signature = self.send_signed(&signed).await?;
        Ok((signature, blockhash))
    }

    /// The earlier attempt that landed, if any can be shown to have.
    ///
    /// A confirmed signature wins. Otherwise a satisfied landing check is
    /// attributed to the first signature sent. Lookup errors count as
    /// "not landed".
    async fn find_landed(&self, sent: &[(Signature, Hash)]) -> Option<(Signature, Hash)> {
        for (signature, blockhash) in sent {
            match self.network.confirm_transaction(signature, self.config.commitment).await {
                Ok(ConfirmationStatus::Confirmed) => return Some((*signature, *blockhash)),
                Ok(_) => {}
                Err(e) => tracing::debug!(%signature, error = %e, "status lookup failed"),
            }
        }

        let check = self.landing?;
        match self.network.account_summary(&check.account).await {
            Ok(Some(account)) if account.owner == check.owner => sent.first().copied(),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!(account = %check.account, error = %e, "landing check failed");
                None
            }
        }
    }

    /// Send an already signed transaction and wait for confirmation.
    pub async fn send_signed(&self, signed: &SignedTransaction) -> BootstrapResult<Signature> {
        let signature = self
            .network
            .send_transaction(signed.transaction())
            .await
            .map_err(|e| e.into_bootstrap(Stage::Send))?;
        tracing::info!(%signature, "transaction sent");

        self.await_confirmation(&signature, &signed.blockhash()).await?;
        Ok(signature)
    }

    async fn await_confirmation(&self, signature: &Signature, blockhash: &Hash) -> BootstrapResult<()> {
        let commitment = self.config.commitment;
        let deadline = Instant::now() + self.config.confirm_timeout;

        loop {
            if self.check_status(signature).await? {
                return Ok(());
            }

            let valid = self
                .network
                .is_blockhash_valid(blockhash, commitment)
                .await
                .map_err(|e| e.into_bootstrap(Stage::Confirm))?;
            if !valid {
                // The transaction may have landed in the last slot of the
                // blockhash's lifetime.
                if self.check_status(signature).await? {
                    return Ok(());
                }
                return Err(BootstrapError::transient(
                    Stage::Confirm,
                    TransientKind::BlockhashExpired,
                    format!("blockhash {blockhash} expired before {signature} was confirmed"),
                ));
            }

            if Instant::now() >= deadline {
                return Err(BootstrapError::transient(
                    Stage::Confirm,
                    TransientKind::Timeout,
                    format!("{signature} not confirmed within {:?}", self.config.confirm_timeout),
                ));
            }

            tracing::debug!(%signature, ?commitment, "waiting for confirmation");
            sleep(self.config.poll_interval).await;
        }
    }

    /// `Ok(true)` once confirmed, `Ok(false)` while pending.
    async fn check_status(&self, signature: &Signature) -> BootstrapResult<bool> {
        let status = self
            .network
            .confirm_transaction(signature, self.config.commitment)
            .await
            .map_err(|e| e.into_bootstrap(Stage::Confirm))?;

        match status {
            ConfirmationStatus::Confirmed => Ok(true),
            ConfirmationStatus::Pending => Ok(false),
            ConfirmationStatus::Failed(err) => Err(classify_transaction_error(Stage::Confirm, err)),
        }
    }
}

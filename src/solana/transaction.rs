//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Sign instructions with the payer and any extra signers
//! - Broadcast and poll until the configured commitment
//! - Simple lamport transfers (uploader funding)

use std::time::Duration;

use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::system_instruction;
use solana_sdk::transaction::Transaction;
use tokio::time::{interval, timeout};

use crate::solana::client::SolanaClient;
use crate::solana::types::{ConfirmationStatus, SolanaError, SolanaResult};
use crate::solana::wallet::Wallet;

/// Sends transactions paid for and signed by one wallet.
#[derive(Clone, Debug)]
pub struct TxSender {
    client: SolanaClient,
    wallet: Wallet,
}

impl TxSender {
    /// Create a new transaction sender.
    pub fn new(client: SolanaClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Build a transaction signed by the payer and `extra_signers`.
    pub async fn build(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
    ) -> SolanaResult<Transaction> {
        let blockhash = self.client.get_latest_blockhash().await?;

        let mut signers: Vec<&Keypair> = Vec::with_capacity(extra_signers.len() + 1);
        signers.push(self.wallet.keypair());
        signers.extend_from_slice(extra_signers);

        let mut transaction = Transaction::new_with_payer(instructions, Some(&self.wallet.pubkey()));
        transaction
            .try_sign(signers.as_slice(), blockhash)
            .map_err(|e| SolanaError::Wallet(format!("Signing failed: {}", e)))?;
        Ok(transaction)
    }

    /// Sign, send and wait until the transaction reaches the commitment level.
    pub async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        extra_signers: &[&Keypair],
    ) -> SolanaResult<Signature> {
        let transaction = self.build(instructions, extra_signers).await?;
        let signature = self.client.send_transaction(&transaction).await?;
        tracing::debug!(signature = %signature, "Transaction sent");

        let config = self.client.config();
        match self
            .wait_for_confirmation(
                &signature,
                Duration::from_secs(config.confirm_timeout_secs),
                Duration::from_millis(config.poll_interval_ms),
            )
            .await?
        {
            ConfirmationStatus::Confirmed { slot } => {
                tracing::debug!(signature = %signature, slot = slot, "Transaction confirmed");
                Ok(signature)
            }
            ConfirmationStatus::Failed(reason) => Err(SolanaError::TransactionFailed(reason)),
            ConfirmationStatus::Pending => Err(SolanaError::ConfirmationTimeout {
                signature: signature.to_string(),
                secs: config.confirm_timeout_secs,
            }),
        }
    }

    /// Poll a signature until it is confirmed, fails, or `max_wait` elapses.
    pub async fn wait_for_confirmation(
        &self,
        signature: &Signature,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> SolanaResult<ConfirmationStatus> {
        let result = timeout(max_wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                match self.client.get_signature_status(signature).await {
                    Ok(ConfirmationStatus::Pending) => {
                        tracing::debug!(signature = %signature, "Transaction pending");
                    }
                    Ok(status) => return status,
                    Err(e) => {
                        tracing::debug!(signature = %signature, error = %e, "Status query failed");
                    }
                }
            }
        })
        .await;

        Ok(result.unwrap_or(ConfirmationStatus::Pending))
    }

    /// Transfer lamports from the wallet.
    pub async fn transfer(&self, to: &Pubkey, lamports: u64) -> SolanaResult<Signature> {
        let instruction = system_instruction::transfer(&self.wallet.pubkey(), to, lamports);
        self.send_and_confirm(&[instruction], &[]).await
    }

    /// Fail with `InsufficientFunds` unless the wallet holds `required` lamports.
    pub async fn ensure_balance(&self, required: u64) -> SolanaResult<u64> {
        let available = self.client.get_balance(&self.wallet.pubkey()).await?;
        if available < required {
            return Err(SolanaError::InsufficientFunds {
                required,
                available,
            });
        }
        Ok(available)
    }

    /// The paying wallet.
    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn client(&self) -> &SolanaClient {
        &self.client
    }
}

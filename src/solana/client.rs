//! Solana RPC client with timeout, failover and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (blockhash, balances, rent, signature status)
//! - Handle timeouts and network errors gracefully

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use tokio::time::timeout;

use crate::solana::types::{
    parse_commitment, ConfirmationStatus, RpcConfig, SolanaError, SolanaResult,
};

/// Solana RPC client wrapper with failover support.
#[derive(Clone)]
pub struct SolanaClient {
    /// Primary client first, then failovers.
    clients: Vec<Arc<RpcClient>>,
    config: RpcConfig,
    commitment: CommitmentConfig,
    timeout_duration: Duration,
}

impl SolanaClient {
    /// Create a new client. No request is made until the first call.
    pub fn new(config: RpcConfig) -> SolanaResult<Self> {
        let timeout_duration = Duration::from_secs(config.timeout_secs.max(1));
        let commitment = parse_commitment(&config.commitment);

        url::Url::parse(&config.url).map_err(|e| {
            SolanaError::Rpc(format!("Invalid RPC URL '{}': {}", config.url, e))
        })?;
        let mut clients = vec![Arc::new(RpcClient::new_with_timeout_and_commitment(
            config.url.clone(),
            timeout_duration,
            commitment,
        ))];

        for url_str in &config.failover_urls {
            if url::Url::parse(url_str).is_ok() {
                clients.push(Arc::new(RpcClient::new_with_timeout_and_commitment(
                    url_str.clone(),
                    timeout_duration,
                    commitment,
                )));
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            rpc_url = %config.url,
            failovers = clients.len() - 1,
            commitment = %config.commitment,
            "Solana client initialized"
        );

        Ok(Self {
            clients,
            config,
            commitment,
            timeout_duration,
        })
    }

    /// Run `op` against each provider in turn.
    ///
    /// Only transport failures and timeouts move on to the next provider. An
    /// error answered by the node itself is returned as-is.
    async fn call<T, F, Fut>(&self, what: &str, op: F) -> SolanaResult<T>
    where
        F: Fn(Arc<RpcClient>) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let mut last_error = None;

        for (i, client) in self.clients.iter().enumerate() {
            match timeout(self.timeout_duration, op(client.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) if is_timeout(&e) => {
                    tracing::warn!(provider_idx = i, "RPC timeout during {}, trying next provider", what);
                }
                Ok(Err(e)) if is_transport_error(&e) => {
                    tracing::warn!(provider_idx = i, error = %e, "RPC error during {}, trying next provider", what);
                    last_error = Some(e);
                }
                Ok(Err(e)) => {
                    return Err(SolanaError::Rpc(format!("Failed to {}: {}", what, e)));
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, "RPC timeout during {}, trying next provider", what);
                }
            }
        }

        // Timeout only when no provider answered at all.
        match last_error {
            Some(e) => Err(SolanaError::Rpc(format!(
                "All RPC providers failed to {}, last error: {}",
                what, e
            ))),
            None => Err(SolanaError::Timeout(self.timeout_duration.as_secs())),
        }
    }

    /// Latest blockhash for transaction signing.
    pub async fn get_latest_blockhash(&self) -> SolanaResult<Hash> {
        self.call("get latest blockhash", |rpc| async move {
            rpc.get_latest_blockhash().await
        })
        .await
    }

    /// Lamports needed for an account of `size` bytes to be rent exempt.
    pub async fn get_minimum_balance_for_rent_exemption(&self, size: usize) -> SolanaResult<u64> {
        self.call("get rent exemption", |rpc| async move {
            rpc.get_minimum_balance_for_rent_exemption(size).await
        })
        .await
    }

    /// Balance of an address in lamports.
    pub async fn get_balance(&self, pubkey: &Pubkey) -> SolanaResult<u64> {
        let pubkey = *pubkey;
        self.call("get balance", |rpc| async move { rpc.get_balance(&pubkey).await })
            .await
    }

    /// Submit a signed transaction; returns its signature without waiting.
    pub async fn send_transaction(&self, transaction: &Transaction) -> SolanaResult<Signature> {
        self.call("send transaction", |rpc| {
            let transaction = transaction.clone();
            async move { rpc.send_transaction(&transaction).await }
        })
        .await
    }

    /// Status of a signature relative to the configured commitment.
    pub async fn get_signature_status(&self, signature: &Signature) -> SolanaResult<ConfirmationStatus> {
        let signature = *signature;
        let statuses = self
            .call("get signature status", |rpc| async move {
                rpc.get_signature_statuses(&[signature]).await
            })
            .await?;

        let status = match statuses.value.into_iter().next().flatten() {
            Some(status) => status,
            None => return Ok(ConfirmationStatus::Pending),
        };

        if let Some(err) = &status.err {
            return Ok(ConfirmationStatus::Failed(err.to_string()));
        }
        if status.satisfies_commitment(self.commitment) {
            return Ok(ConfirmationStatus::Confirmed { slot: status.slot });
        }
        Ok(ConfirmationStatus::Pending)
    }

    /// Check if the node is reachable and reports itself healthy.
    pub async fn is_healthy(&self) -> bool {
        self.call("get health", |rpc| async move { rpc.get_health().await })
            .await
            .is_ok()
    }

    /// Get the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Commitment level transactions must reach.
    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }
}

fn is_timeout(error: &ClientError) -> bool {
    matches!(error.kind(), ClientErrorKind::Reqwest(e) if e.is_timeout())
}

/// Whether the request never got a usable answer from the node.
fn is_transport_error(error: &ClientError) -> bool {
    matches!(error.kind(), ClientErrorKind::Io(_) | ClientErrorKind::Reqwest(_))
}

impl std::fmt::Debug for SolanaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaClient")
            .field("rpc_url", &self.config.url)
            .field("providers", &self.clients.len())
            .field("commitment", &self.config.commitment)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

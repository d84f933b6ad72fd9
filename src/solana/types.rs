//! Chain-specific types and error definitions.

use solana_sdk::commitment_config::CommitmentConfig;
use thiserror::Error;

pub use crate::config::schema::RpcConfig;

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum SolanaError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Transaction did not reach the commitment level in time.
    #[error("Transaction {signature} not confirmed after {secs} seconds")]
    ConfirmationTimeout { signature: String, secs: u64 },

    /// Transaction landed but the runtime rejected it.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Invalid keypair format or missing key material.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Payer cannot cover the lamports an operation needs.
    #[error("Insufficient funds: need {required} lamports, have {available}")]
    InsufficientFunds { required: u64, available: u64 },

    /// A base58 address failed to parse.
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

/// Result type for chain operations.
pub type SolanaResult<T> = Result<T, SolanaError>;

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Not yet seen, or seen below the required commitment.
    Pending,
    /// Reached the required commitment.
    Confirmed { slot: u64 },
    /// Landed with an error.
    Failed(String),
}

/// Parse a configured commitment level.
///
/// Unknown values fall back to `confirmed`; validation rejects them earlier.
pub fn parse_commitment(level: &str) -> CommitmentConfig {
    match level {
        "processed" => CommitmentConfig::processed(),
        "finalized" => CommitmentConfig::finalized(),
        _ => CommitmentConfig::confirmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commitment() {
        assert_eq!(parse_commitment("processed"), CommitmentConfig::processed());
        assert_eq!(parse_commitment("finalized"), CommitmentConfig::finalized());
        assert_eq!(parse_commitment("confirmed"), CommitmentConfig::confirmed());
        assert_eq!(parse_commitment("bogus"), CommitmentConfig::confirmed());
    }

    #[test]
    fn test_error_display() {
        let err = SolanaError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = SolanaError::InsufficientFunds {
            required: 5_000,
            available: 42,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: need 5000 lamports, have 42"
        );
    }

    #[test]
    fn test_confirmation_status() {
        let status = ConfirmationStatus::Confirmed { slot: 100 };
        assert!(matches!(status, ConfirmationStatus::Confirmed { .. }));
        assert_ne!(status, ConfirmationStatus::Pending);
    }
}

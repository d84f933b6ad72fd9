//! Signing identity management.
//!
//! # Security
//! - Key material comes from an environment variable or a keypair file
//! - Keys are never logged or serialized
//! - `Debug` shows only the public key

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::keypair::{read_keypair, read_keypair_file, Keypair};
use solana_sdk::signer::Signer;

use crate::config::WalletConfig;
use crate::solana::types::{SolanaError, SolanaResult};

/// Environment variable holding the keypair as a JSON byte array.
pub const KEYPAIR_ENV_VAR: &str = "CNFT_WALLET_KEYPAIR";

/// The payer and update authority for every transaction of a run.
#[derive(Clone)]
pub struct Wallet {
    keypair: Arc<Keypair>,
}

impl Wallet {
    /// Wrap an existing keypair.
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Parse a keypair from the Solana CLI format: a JSON array of 64 bytes.
    pub fn from_json_bytes(json: &str) -> SolanaResult<Self> {
        let keypair = read_keypair(&mut Cursor::new(json.trim().as_bytes()))
            .map_err(|e| SolanaError::Wallet(format!("Invalid keypair format: {}", e)))?;
        let wallet = Self::new(keypair);
        tracing::info!(address = %wallet.pubkey(), "Wallet initialized");
        Ok(wallet)
    }

    /// Load a Solana CLI keypair file.
    pub fn from_file(path: &Path) -> SolanaResult<Self> {
        let keypair = read_keypair_file(path).map_err(|e| {
            SolanaError::Wallet(format!("Failed to read keypair {}: {}", path.display(), e))
        })?;
        let wallet = Self::new(keypair);
        tracing::info!(address = %wallet.pubkey(), path = %path.display(), "Wallet initialized");
        Ok(wallet)
    }

    /// Load wallet from `CNFT_WALLET_KEYPAIR`.
    pub fn from_env() -> SolanaResult<Self> {
        let json = std::env::var(KEYPAIR_ENV_VAR).map_err(|_| {
            SolanaError::Wallet(format!("Environment variable {} not set", KEYPAIR_ENV_VAR))
        })?;
        Self::from_json_bytes(&json)
    }

    /// Resolve the identity: environment first, then the configured file.
    pub fn load(config: &WalletConfig) -> SolanaResult<Self> {
        if std::env::var_os(KEYPAIR_ENV_VAR).is_some() {
            return Self::from_env();
        }
        match &config.keypair_path {
            Some(path) => Self::from_file(path),
            None => Err(SolanaError::Wallet(format!(
                "No keypair configured: set {} or wallet.keypair_path",
                KEYPAIR_ENV_VAR
            ))),
        }
    }

    /// The wallet's address.
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// The underlying keypair, for transaction signing.
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    /// Raw ed25519 signature over `message`.
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.keypair.sign_message(message)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the minter.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for a mint run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MinterConfig {
    /// Solana RPC settings.
    pub rpc: RpcConfig,

    /// Where the signing identity comes from.
    pub wallet: WalletConfig,

    /// Merkle tree shape.
    pub tree: TreeConfig,

    /// Storage uploader settings.
    pub uploader: UploaderConfig,

    /// The NFT being minted.
    pub nft: NftConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Solana JSON-RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,

    /// Failover JSON-RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub timeout_secs: u64,

    /// Commitment level transactions must reach (processed, confirmed, finalized).
    pub commitment: String,

    /// Maximum time to wait for a transaction to reach the commitment level.
    pub confirm_timeout_secs: u64,

    /// Signature status polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.devnet.solana.com".to_string(),
            failover_urls: Vec::new(),
            timeout_secs: 30,
            commitment: "confirmed".to_string(),
            confirm_timeout_secs: 90,
            poll_interval_ms: 1000,
        }
    }
}

/// Signing identity configuration.
///
/// The `CNFT_WALLET_KEYPAIR` environment variable takes precedence over
/// `keypair_path`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Path to a Solana CLI keypair file (JSON byte array).
    pub keypair_path: Option<PathBuf>,
}

/// Concurrent merkle tree parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Tree depth; capacity is 2^max_depth leaves.
    pub max_depth: u32,

    /// Number of concurrent changes the tree can absorb per slot.
    pub max_buffer_size: u32,

    /// Number of upper levels cached on-chain.
    pub canopy_depth: u32,

    /// Allow anyone to mint into the tree.
    pub public: Option<bool>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 7,
            max_buffer_size: 16,
            canopy_depth: 4,
            public: None,
        }
    }
}

/// Irys uploader configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploaderConfig {
    /// Irys node address.
    pub address: String,

    /// Gateway used to build retrievable URIs.
    pub gateway_url: String,

    /// Safety margin applied to the quoted upload price.
    pub price_multiplier: f64,

    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum upload retry attempts on 5xx or transport errors.
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            address: "https://devnet.irys.xyz".to_string(),
            gateway_url: "https://gateway.irys.xyz".to_string(),
            price_multiplier: 1.1,
            timeout_secs: 60,
            max_retries: 3,
            retry_base_delay_ms: 500,
            retry_max_delay_ms: 5000,
        }
    }
}

/// A single `trait_type`/`value` pair in the off-chain metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttributeConfig {
    pub trait_type: String,
    pub value: String,
}

/// The NFT being minted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NftConfig {
    /// On-chain name (max 32 bytes).
    pub name: String,

    /// On-chain symbol (max 10 bytes).
    pub symbol: String,

    /// Royalty in basis points (500 = 5%).
    pub seller_fee_basis_points: u16,

    /// Whether the metadata can be updated later.
    pub is_mutable: bool,

    /// Base58 address that receives the NFT.
    pub recipient: String,

    /// Collection key; the tree address is used when absent.
    pub collection: Option<String>,

    /// Image uploaded alongside the metadata.
    pub image_path: PathBuf,

    /// Name written to the off-chain JSON document.
    pub metadata_name: String,

    pub description: Option<String>,

    pub external_url: Option<String>,

    pub attributes: Vec<AttributeConfig>,
}

impl Default for NftConfig {
    fn default() -> Self {
        Self {
            name: "Compressed NFT".to_string(),
            symbol: String::new(),
            seller_fee_basis_points: 500,
            is_mutable: true,
            recipient: String::new(),
            collection: None,
            image_path: PathBuf::from("pfp.jpg"),
            metadata_name: "Compressed NFT".to_string(),
            description: None,
            external_url: None,
            attributes: Vec::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

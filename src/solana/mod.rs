//! Solana chain access.
//!
//! # Data Flow
//! ```text
//! Keypair file or environment variable
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts and failover)
//!     → transaction.rs (build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Never log secret keys
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::SolanaClient;
pub use transaction::TxSender;
pub use types::{ConfirmationStatus, SolanaError, SolanaResult};
pub use wallet::Wallet;

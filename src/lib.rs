//! Compressed NFT minter library.
//!
//! Creates a Bubblegum merkle tree, uploads an image and its JSON metadata to
//! Irys, and mints one compressed NFT to a recipient.

pub mod bubblegum;
pub mod config;
pub mod metadata;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod solana;
pub mod storage;

pub use config::MinterConfig;
pub use pipeline::{MintError, MintPipeline, MintReport};

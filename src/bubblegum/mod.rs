//! Bubblegum compressed-NFT instruction encoding.
//!
//! # Data Flow
//! ```text
//! TreeConfig ──▶ tree.rs (shape checks, account size)
//!                   │
//!                   ▼
//!           instructions.rs ──▶ create_account + create_tree_config
//!                   ▲
//! NftConfig ──▶ metadata.rs (MetadataArgs, borsh) ──▶ mint_v1
//! ```

pub mod instructions;
pub mod metadata;
pub mod tree;

use solana_sdk::pubkey::Pubkey;

/// Bubblegum program.
pub const BUBBLEGUM_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("BGUMAp9Gq7iTEuizy4pqaxsTyUCBK68MDfK752saRPUY");

/// SPL account-compression program; owns merkle tree accounts.
pub const ACCOUNT_COMPRESSION_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("cmtDvXumGCrqC1Age74AVPhSRVXJMd8PJS91L8KbNCK");

/// SPL noop program used as the log wrapper.
pub const NOOP_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("noopb9bkMVfRPU8ShW8hZfmtNkrzSLpaBuGr1wv1iTV");

pub use instructions::{create_tree_instructions, mint_v1_instruction, tree_config_pda};
pub use metadata::{Collection, Creator, MetadataArgs, TokenProgramVersion, TokenStandard};
pub use tree::{TreeError, TreeParams};

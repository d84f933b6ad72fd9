//! On-chain metadata carried by a compressed NFT leaf.
//!
//! Field order and enum variant order match the Bubblegum program's borsh
//! layout and must not be rearranged.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::pubkey::Pubkey;

pub const MAX_NAME_LENGTH: usize = 32;
pub const MAX_SYMBOL_LENGTH: usize = 10;
pub const MAX_URI_LENGTH: usize = 200;
pub const MAX_CREATOR_LIMIT: usize = 5;

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenStandard {
    NonFungible,
    FungibleAsset,
    Fungible,
    NonFungibleEdition,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenProgramVersion {
    Original,
    Token2022,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseMethod {
    Burn,
    Multiple,
    Single,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Uses {
    pub use_method: UseMethod,
    pub remaining: u64,
    pub total: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    pub verified: bool,
    pub key: Pubkey,
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Creator {
    pub address: Pubkey,
    /// Only signers of the mint transaction may be marked verified.
    pub verified: bool,
    /// Percentage of royalties; shares across creators sum to 100.
    pub share: u8,
}

/// Arguments to `mint_v1`.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct MetadataArgs {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub seller_fee_basis_points: u16,
    pub primary_sale_happened: bool,
    pub is_mutable: bool,
    pub edition_nonce: Option<u8>,
    pub token_standard: Option<TokenStandard>,
    pub collection: Option<Collection>,
    pub uses: Option<Uses>,
    pub token_program_version: TokenProgramVersion,
    pub creators: Vec<Creator>,
}

impl MetadataArgs {
    /// A non-fungible leaf with the program's usual defaults: empty symbol,
    /// mutable, primary sale not yet happened, original token program.
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: String::new(),
            uri: uri.into(),
            seller_fee_basis_points: 0,
            primary_sale_happened: false,
            is_mutable: true,
            edition_nonce: None,
            token_standard: Some(TokenStandard::NonFungible),
            collection: None,
            uses: None,
            token_program_version: TokenProgramVersion::Original,
            creators: Vec::new(),
        }
    }

    /// Check the limits the program enforces, before paying for a transaction.
    pub fn check(&self) -> Result<(), String> {
        if self.name.len() > MAX_NAME_LENGTH {
            return Err(format!("name longer than {} bytes", MAX_NAME_LENGTH));
        }
        if self.symbol.len() > MAX_SYMBOL_LENGTH {
            return Err(format!("symbol longer than {} bytes", MAX_SYMBOL_LENGTH));
        }
        if self.uri.len() > MAX_URI_LENGTH {
            return Err(format!("uri longer than {} bytes", MAX_URI_LENGTH));
        }
        if self.seller_fee_basis_points > 10_000 {
            return Err("seller_fee_basis_points above 10000".to_string());
        }
        if self.creators.len() > MAX_CREATOR_LIMIT {
            return Err(format!("more than {} creators", MAX_CREATOR_LIMIT));
        }
        if !self.creators.is_empty() {
            let total: u32 = self.creators.iter().map(|c| c.share as u32).sum();
            if total != 100 {
                return Err(format!("creator shares sum to {}, expected 100", total));
            }
        }
        Ok(())
    }
}

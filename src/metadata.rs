//! NFT metadata: the off-chain JSON document and the on-chain leaf args.

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;

use crate::bubblegum::metadata::{Collection, Creator, MetadataArgs};
use crate::config::NftConfig;

/// A `trait_type`/`value` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFile {
    pub uri: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Properties {
    pub files: Vec<MetadataFile>,
}

/// JSON document the on-chain `uri` points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffchainMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: String,
    #[serde(rename = "externalUrl", default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub properties: Properties,
}

impl OffchainMetadata {
    /// Document for an uploaded image.
    pub fn from_config(nft: &NftConfig, image_uri: &str, image_content_type: &str) -> Self {
        Self {
            name: nft.metadata_name.clone(),
            symbol: (!nft.symbol.is_empty()).then(|| nft.symbol.clone()),
            description: nft.description.clone(),
            image: image_uri.to_string(),
            external_url: nft.external_url.clone(),
            attributes: nft
                .attributes
                .iter()
                .map(|a| Attribute {
                    trait_type: a.trait_type.clone(),
                    value: a.value.clone(),
                })
                .collect(),
            properties: Properties {
                files: vec![MetadataFile {
                    uri: image_uri.to_string(),
                    content_type: image_content_type.to_string(),
                }],
            },
        }
    }
}

/// Leaf metadata for `mint_v1`.
///
/// `creator` is the single verified creator with the full share; the
/// collection, when given, is unverified.
pub fn metadata_args(
    nft: &NftConfig,
    uri: &str,
    collection: Option<Pubkey>,
    creator: Pubkey,
) -> MetadataArgs {
    let mut args = MetadataArgs::new(nft.name.clone(), uri);
    args.symbol = nft.symbol.clone();
    args.seller_fee_basis_points = nft.seller_fee_basis_points;
    args.is_mutable = nft.is_mutable;
    args.collection = collection.map(|key| Collection {
        verified: false,
        key,
    });
    args.creators = vec![Creator {
        address: creator,
        verified: true,
        share: 100,
    }];
    args
}

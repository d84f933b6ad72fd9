//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, addresses and value ranges
//! - Reject tree shapes the compression program cannot allocate
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MinterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::bubblegum::tree::TreeParams;
use crate::bubblegum::metadata::{MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH};
use crate::config::schema::MinterConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `tree.max_depth`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MinterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "rpc.url", &config.rpc.url);
    for url in &config.rpc.failover_urls {
        check_url(&mut errors, "rpc.failover_urls", url);
    }
    if !matches!(
        config.rpc.commitment.as_str(),
        "processed" | "confirmed" | "finalized"
    ) {
        errors.push(ValidationError::new(
            "rpc.commitment",
            format!(
                "'{}' is not one of processed, confirmed, finalized",
                config.rpc.commitment
            ),
        ));
    }
    if config.rpc.timeout_secs == 0 {
        errors.push(ValidationError::new("rpc.timeout_secs", "must be greater than 0"));
    }
    if config.rpc.confirm_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "rpc.confirm_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.rpc.poll_interval_ms == 0 {
        errors.push(ValidationError::new("rpc.poll_interval_ms", "must be greater than 0"));
    }

    if let Err(e) = TreeParams::from(&config.tree).validate() {
        errors.push(ValidationError::new("tree", e.to_string()));
    }

    check_url(&mut errors, "uploader.address", &config.uploader.address);
    check_url(&mut errors, "uploader.gateway_url", &config.uploader.gateway_url);
    let multiplier = config.uploader.price_multiplier;
    if multiplier.is_nan() || multiplier < 1.0 {
        errors.push(ValidationError::new(
            "uploader.price_multiplier",
            "must be at least 1.0",
        ));
    }
    if config.uploader.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "uploader.timeout_secs",
            "must be greater than 0",
        ));
    }

    let nft = &config.nft;
    if nft.recipient.is_empty() {
        errors.push(ValidationError::new("nft.recipient", "is required"));
    } else {
        check_pubkey(&mut errors, "nft.recipient", &nft.recipient);
    }
    if let Some(collection) = &nft.collection {
        check_pubkey(&mut errors, "nft.collection", collection);
    }
    if nft.name.len() > MAX_NAME_LENGTH {
        errors.push(ValidationError::new(
            "nft.name",
            format!("must be at most {} bytes", MAX_NAME_LENGTH),
        ));
    }
    if nft.symbol.len() > MAX_SYMBOL_LENGTH {
        errors.push(ValidationError::new(
            "nft.symbol",
            format!("must be at most {} bytes", MAX_SYMBOL_LENGTH),
        ));
    }
    if nft.seller_fee_basis_points > 10_000 {
        errors.push(ValidationError::new(
            "nft.seller_fee_basis_points",
            "must be at most 10000",
        ));
    }
    if let Some(external_url) = &nft.external_url {
        check_url(&mut errors, "nft.external_url", external_url);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", value, e)));
    }
}

fn check_pubkey(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if Pubkey::from_str(value).is_err() {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a valid base58 address", value),
        ));
    }
}

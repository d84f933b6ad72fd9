//! Irys storage node client.
//!
//! # Responsibilities
//! - Quote upload prices and read the node-side balance
//! - Top up the balance from the wallet when a quote exceeds it
//! - Sign and post data items, retrying transient failures

use std::str::FromStr;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use crate::config::UploaderConfig;
use crate::resilience::RetryPolicy;
use crate::solana::{TxSender, Wallet};
use crate::storage::bundle::{DataItem, Tag};
use crate::storage::{GenericFile, UploadError, UploadResult, Uploader};

/// Currency segment of the node's REST paths.
const CURRENCY: &str = "solana";

#[derive(Debug, Deserialize)]
struct InfoResponse {
    addresses: std::collections::HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: Option<String>,
}

/// Uploads files to an Irys node, paying with the wallet's lamports.
#[derive(Clone)]
pub struct IrysUploader {
    http: Client,
    address: String,
    gateway_url: String,
    wallet: Wallet,
    funder: Option<TxSender>,
    price_multiplier: f64,
    retry: RetryPolicy,
}

impl IrysUploader {
    /// Create an uploader that signs with `wallet`.
    ///
    /// Without a funder, uploads that cost more than the node balance fail.
    pub fn new(config: &UploaderConfig, wallet: Wallet) -> UploadResult<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            address: config.address.trim_end_matches('/').to_string(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            wallet,
            funder: None,
            price_multiplier: config.price_multiplier,
            retry: RetryPolicy::from(config),
        })
    }

    /// Pay for storage shortfalls from the sender's wallet.
    pub fn with_funder(mut self, funder: TxSender) -> Self {
        self.funder = Some(funder);
        self
    }

    /// Retrievable URI for an item id.
    pub fn uri_for(&self, id: &str) -> String {
        format!("{}/{}", self.gateway_url, id)
    }

    /// Price in lamports to store `bytes` bytes.
    pub async fn get_price(&self, bytes: u64) -> UploadResult<u64> {
        let url = format!("{}/price/{}/{}", self.address, CURRENCY, bytes);
        let response = self.send_with_retry("price", || self.http.get(&url)).await?;
        let text = response.text().await?;
        text.trim()
            .parse::<u64>()
            .map_err(|_| UploadError::UnexpectedResponse(format!("price '{}'", text.trim())))
    }

    /// The wallet's prepaid balance on the node, in lamports.
    pub async fn get_balance(&self) -> UploadResult<u64> {
        let url = format!(
            "{}/account/balance/{}?address={}",
            self.address,
            CURRENCY,
            self.wallet.pubkey()
        );
        let response = self.send_with_retry("balance", || self.http.get(&url)).await?;
        let body: Value = response.json().await?;
        parse_balance(&body)
    }

    /// The node's deposit address.
    pub async fn node_address(&self) -> UploadResult<Pubkey> {
        let url = format!("{}/info", self.address);
        let response = self.send_with_retry("info", || self.http.get(&url)).await?;
        let info: InfoResponse = response.json().await?;
        let address = info.addresses.get(CURRENCY).ok_or_else(|| {
            UploadError::UnexpectedResponse(format!("no {} deposit address", CURRENCY))
        })?;
        Pubkey::from_str(address)
            .map_err(|_| UploadError::UnexpectedResponse(format!("deposit address '{}'", address)))
    }

    /// Transfer `lamports` to the node and register the deposit.
    pub async fn fund(&self, lamports: u64) -> UploadResult<()> {
        let funder = self.funder.as_ref().ok_or_else(|| {
            UploadError::Funding("no wallet connection available to fund uploads".to_string())
        })?;
        let node = self.node_address().await?;

        tracing::info!(lamports = lamports, node = %node, "Funding storage node");
        let signature = funder
            .transfer(&node, lamports)
            .await
            .map_err(|e| UploadError::Funding(e.to_string()))?;

        let url = format!("{}/account/balance/{}", self.address, CURRENCY);
        let body = serde_json::json!({ "tx_id": signature.to_string() });
        self.send_with_retry("register deposit", || self.http.post(&url).json(&body))
            .await?;

        tracing::info!(signature = %signature, "Storage node funded");
        Ok(())
    }

    /// Make sure the node balance covers `bytes` bytes of uploads.
    async fn ensure_funded(&self, bytes: u64) -> UploadResult<()> {
        let price = self.get_price(bytes).await?;
        if price == 0 {
            tracing::debug!(bytes = bytes, "Upload is free");
            return Ok(());
        }

        let required = apply_multiplier(price, self.price_multiplier);
        let balance = self.get_balance().await?;
        tracing::debug!(bytes = bytes, price = price, balance = balance, "Upload quote");

        if balance >= required {
            return Ok(());
        }
        self.fund(required - balance).await
    }

    /// Post one signed item; returns the id the node assigned.
    async fn upload_item(&self, item: &DataItem) -> UploadResult<String> {
        let url = format!("{}/tx/{}", self.address, CURRENCY);
        let bytes = item.to_bytes();
        let response = self
            .send_with_retry("upload", || {
                self.http
                    .post(&url)
                    .header(CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.clone())
            })
            .await?;

        let local_id = item.id();
        let body: UploadResponse = response.json().await?;
        match body.id {
            Some(id) if id != local_id => {
                tracing::warn!(node_id = %id, local_id = %local_id, "Node returned a different item id");
                Ok(id)
            }
            _ => Ok(local_id),
        }
    }

    /// Send a request, retrying 5xx answers and transport errors.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> UploadResult<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            let error = match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    let error = UploadError::Status {
                        status: status.as_u16(),
                        body,
                    };
                    if !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) => UploadError::Http(e),
            };

            if !self.retry.should_retry(attempt) {
                return Err(error);
            }
            attempt += 1;
            let delay = self.retry.delay(attempt);
            tracing::warn!(
                request = what,
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Storage request failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

impl Uploader for IrysUploader {
    async fn upload(&self, files: &[GenericFile]) -> UploadResult<Vec<String>> {
        let items = files
            .iter()
            .map(|file| {
                DataItem::sign(
                    &self.wallet,
                    file.bytes.clone(),
                    vec![Tag::new("Content-Type", file.content_type.clone())],
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_bytes: u64 = items.iter().map(|item| item.to_bytes().len() as u64).sum();
        self.ensure_funded(total_bytes).await?;

        let mut uris = Vec::with_capacity(items.len());
        for (file, item) in files.iter().zip(&items) {
            let id = self.upload_item(item).await?;
            let uri = self.uri_for(&id);
            tracing::debug!(file = %file.file_name, bytes = file.bytes.len(), uri = %uri, "File uploaded");
            uris.push(uri);
        }
        Ok(uris)
    }
}

impl std::fmt::Debug for IrysUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IrysUploader")
            .field("address", &self.address)
            .field("gateway_url", &self.gateway_url)
            .field("funded", &self.funder.is_some())
            .finish()
    }
}

/// `price * multiplier`, rounded up, in integer basis points.
fn apply_multiplier(price: u64, multiplier: f64) -> u64 {
    let bps = (multiplier * 10_000.0).round() as u128;
    (price as u128 * bps).div_ceil(10_000) as u64
}

/// Balance arrives as a decimal string or a number.
fn parse_balance(body: &Value) -> UploadResult<u64> {
    match body.get("balance") {
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| UploadError::UnexpectedResponse(format!("balance '{}'", s))),
        Some(Value::Number(n)) => n
            .as_u64()
            .ok_or_else(|| UploadError::UnexpectedResponse(format!("balance {}", n))),
        _ => Err(UploadError::UnexpectedResponse("missing balance".to_string())),
    }
}

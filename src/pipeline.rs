//! The mint sequence: create tree, upload image, upload metadata, mint.
//!
//! Each step logs its result; the first failure aborts the remaining steps.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::keypair::Keypair;
use solana_sdk::signer::Signer;
use thiserror::Error;

use crate::bubblegum::{create_tree_instructions, mint_v1_instruction, TreeError, TreeParams};
use crate::config::{ConfigError, MinterConfig};
use crate::metadata::{metadata_args, OffchainMetadata};
use crate::solana::{SolanaError, TxSender};
use crate::storage::{GenericFile, UploadError, Uploader};

/// Space reserved for the Bubblegum tree config PDA.
pub const TREE_CONFIG_SIZE: usize = 96;

/// Fee allowance for the two signatures on the create-tree transaction.
pub const CREATE_TREE_FEE_LAMPORTS: u64 = 10_000;

/// Errors from any step of a mint run.
#[derive(Debug, Error)]
pub enum MintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Solana(#[from] SolanaError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Invalid tree parameters: {0}")]
    Tree(#[from] TreeError),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The create-tree transaction was sent but never reached the commitment
    /// level; the account may still land.
    #[error("Tree {tree} was submitted but not confirmed: {source}")]
    TreeUnconfirmed {
        tree: Pubkey,
        #[source]
        source: SolanaError,
    },

    #[error("Failed to encode instruction: {0}")]
    Encoding(#[source] std::io::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type MintResult<T> = Result<T, MintError>;

/// A freshly created merkle tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTree {
    pub address: Pubkey,
    pub signature: Signature,
}

/// An uploaded file and the content type it was stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub uri: String,
    pub content_type: String,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MintReport {
    pub tree: String,
    pub tree_signature: String,
    pub image_uri: String,
    pub metadata_uri: String,
    pub recipient: String,
    pub signature: String,
}

/// Runs the mint steps against one wallet, RPC and uploader.
pub struct MintPipeline<U> {
    config: MinterConfig,
    sender: TxSender,
    uploader: U,
}

impl<U: Uploader> MintPipeline<U> {
    pub fn new(config: MinterConfig, sender: TxSender, uploader: U) -> Self {
        Self {
            config,
            sender,
            uploader,
        }
    }

    /// Allocate a new tree owned by the wallet.
    pub async fn create_tree(&self) -> MintResult<CreatedTree> {
        let params = TreeParams::from(&self.config.tree);
        params.validate()?;

        let client = self.sender.client();
        let size = params.account_size();
        let tree_rent = client.get_minimum_balance_for_rent_exemption(size).await?;
        let config_rent = client
            .get_minimum_balance_for_rent_exemption(TREE_CONFIG_SIZE)
            .await?;
        self.sender
            .ensure_balance(tree_rent + config_rent + CREATE_TREE_FEE_LAMPORTS)
            .await?;

        let tree = Keypair::new();
        let payer = self.sender.wallet().pubkey();
        let instructions =
            create_tree_instructions(&payer, &tree.pubkey(), &payer, &params, tree_rent)
                .map_err(MintError::Encoding)?;

        tracing::info!(
            tree = %tree.pubkey(),
            account_size = size,
            rent_lamports = tree_rent,
            "Creating merkle tree"
        );
        let signature = self
            .sender
            .send_and_confirm(&instructions, &[&tree])
            .await
            .map_err(|e| match e {
                SolanaError::ConfirmationTimeout { .. } => MintError::TreeUnconfirmed {
                    tree: tree.pubkey(),
                    source: e,
                },
                other => MintError::Solana(other),
            })?;

        tracing::info!(
            tree = %tree.pubkey(),
            signature = %signature,
            capacity = params.capacity(),
            "Merkle tree created successfully"
        );
        Ok(CreatedTree {
            address: tree.pubkey(),
            signature,
        })
    }

    /// Upload a local file.
    pub async fn upload_file(&self, path: &Path) -> MintResult<UploadedFile> {
        let file = GenericFile::from_path(path).map_err(|source| MintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content_type = file.content_type.clone();

        let uris = self.uploader.upload(std::slice::from_ref(&file)).await?;
        let uri = uris.into_iter().next().ok_or(UploadError::EmptyResponse)?;
        Ok(UploadedFile { uri, content_type })
    }

    /// Upload the configured image.
    pub async fn upload_image(&self) -> MintResult<UploadedFile> {
        let image = self.upload_file(&self.config.nft.image_path).await?;
        tracing::info!(uri = %image.uri, "Image uploaded");
        Ok(image)
    }

    /// Upload the JSON document describing the NFT.
    pub async fn upload_metadata(&self, image: &UploadedFile) -> MintResult<String> {
        let document = OffchainMetadata::from_config(&self.config.nft, &image.uri, &image.content_type);
        let uri = self.uploader.upload_json(&document).await?;
        tracing::info!(uri = %uri, "Metadata uploaded");
        Ok(uri)
    }

    /// Mint one NFT into `tree` for the configured recipient.
    pub async fn mint(&self, tree: &Pubkey, metadata_uri: &str) -> MintResult<Signature> {
        let recipient = parse_pubkey(&self.config.nft.recipient)?;
        let collection = match &self.config.nft.collection {
            Some(key) => parse_pubkey(key)?,
            None => *tree,
        };

        let identity = self.sender.wallet().pubkey();
        let args = metadata_args(&self.config.nft, metadata_uri, Some(collection), identity);
        args.check().map_err(MintError::InvalidMetadata)?;

        let instruction = mint_v1_instruction(tree, &recipient, None, &identity, &identity, &args)
            .map_err(MintError::Encoding)?;
        let signature = self.sender.send_and_confirm(&[instruction], &[]).await?;

        tracing::info!(
            signature = %signature,
            tree = %tree,
            recipient = %recipient,
            "NFT minted successfully"
        );
        Ok(signature)
    }

    /// All four steps in order.
    pub async fn run(&self) -> MintResult<MintReport> {
        // Fail on a bad recipient before spending anything.
        let recipient = parse_pubkey(&self.config.nft.recipient)?;

        let tree = self.create_tree().await?;
        let image = self.upload_image().await?;
        let metadata_uri = self.upload_metadata(&image).await?;
        let signature = self.mint(&tree.address, &metadata_uri).await?;

        Ok(MintReport {
            tree: tree.address.to_string(),
            tree_signature: tree.signature.to_string(),
            image_uri: image.uri,
            metadata_uri,
            recipient: recipient.to_string(),
            signature: signature.to_string(),
        })
    }

    pub fn config(&self) -> &MinterConfig {
        &self.config
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }
}

/// Parse a base58 address.
pub fn parse_pubkey(value: &str) -> Result<Pubkey, SolanaError> {
    Pubkey::from_str(value).map_err(|_| SolanaError::InvalidAddress(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RpcConfig;
    use crate::solana::{SolanaClient, Wallet};
    use crate::storage::UploadResult;
    use std::io::Write;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryUploader {
        files: Mutex<Vec<GenericFile>>,
    }

    impl Uploader for MemoryUploader {
        async fn upload(&self, files: &[GenericFile]) -> UploadResult<Vec<String>> {
            let mut stored = self.files.lock().unwrap();
            Ok(files
                .iter()
                .map(|file| {
                    stored.push(file.clone());
                    format!("https://gateway.test/{}", stored.len())
                })
                .collect())
        }
    }

    fn pipeline(config: MinterConfig) -> MintPipeline<MemoryUploader> {
        let rpc = RpcConfig {
            url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            ..RpcConfig::default()
        };
        let sender = TxSender::new(
            SolanaClient::new(rpc).unwrap(),
            Wallet::new(Keypair::new()),
        );
        MintPipeline::new(config, sender, MemoryUploader::default())
    }

    #[tokio::test]
    async fn test_upload_image_then_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let image_path = dir.path().join("pfp.jpg");
        std::fs::File::create(&image_path)
            .unwrap()
            .write_all(b"\xff\xd8\xff\xe0")
            .unwrap();

        let mut config = MinterConfig::default();
        config.nft.image_path = image_path;
        config.nft.metadata_name = "howdy".to_string();
        let pipeline = pipeline(config);

        let image = pipeline.upload_image().await.unwrap();
        assert_eq!(image.uri, "https://gateway.test/1");
        assert_eq!(image.content_type, "image/jpeg");

        let metadata_uri = pipeline.upload_metadata(&image).await.unwrap();
        assert_eq!(metadata_uri, "https://gateway.test/2");

        let files = pipeline.uploader().files.lock().unwrap();
        let document: serde_json::Value = serde_json::from_slice(&files[1].bytes).unwrap();
        assert_eq!(document["name"], "howdy");
        assert_eq!(document["image"], "https://gateway.test/1");
        assert_eq!(document["properties"]["files"][0]["type"], "image/jpeg");
    }

    #[tokio::test]
    async fn test_missing_image_is_io_error() {
        let mut config = MinterConfig::default();
        config.nft.image_path = PathBuf::from("/nonexistent/pfp.jpg");
        let err = pipeline(config).upload_image().await.unwrap_err();
        assert!(matches!(err, MintError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/pfp.jpg"));
    }

    #[tokio::test]
    async fn test_run_rejects_bad_recipient_first() {
        let mut config = MinterConfig::default();
        config.nft.recipient = "nope".to_string();
        let pipeline = pipeline(config);

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, MintError::Solana(SolanaError::InvalidAddress(_))));
        assert!(pipeline.uploader().files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_tree_rejects_bad_shape_offline() {
        let mut config = MinterConfig::default();
        config.tree.max_buffer_size = 17;
        let err = pipeline(config).create_tree().await.unwrap_err();
        assert!(matches!(err, MintError::Tree(TreeError::UnsupportedShape { .. })));
    }

    #[tokio::test]
    async fn test_mint_rejects_long_uri_offline() {
        let mut config = MinterConfig::default();
        config.nft.recipient = Pubkey::new_unique().to_string();
        let err = pipeline(config)
            .mint(&Pubkey::new_unique(), &"u".repeat(201))
            .await
            .unwrap_err();
        assert!(matches!(err, MintError::InvalidMetadata(_)));
    }

    #[test]
    fn test_parse_pubkey() {
        let key = Pubkey::new_unique();
        assert_eq!(parse_pubkey(&key.to_string()).unwrap(), key);
        assert!(parse_pubkey("0x1234").is_err());
    }
}

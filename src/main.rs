//! `cnft-mint`: create a merkle tree, upload an image and metadata, and mint
//! a compressed NFT.
//!
//! # Flow
//!
//! ```text
//!   mint.toml ──▶ config ──▶ wallet + RPC client + Irys uploader
//!                                   │
//!                                   ▼
//!   create tree ──▶ upload image ──▶ upload metadata ──▶ mint
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use cnft_minter::bubblegum::TreeParams;
use cnft_minter::config::{read_config_or_default, validate_config, ConfigError, MinterConfig};
use cnft_minter::observability::init_logging;
use cnft_minter::pipeline::{parse_pubkey, MintError, MintPipeline};
use cnft_minter::solana::{SolanaClient, TxSender, Wallet};
use cnft_minter::storage::IrysUploader;

const DEFAULT_CONFIG_PATH: &str = "mint.toml";

#[derive(Parser)]
#[command(name = "cnft-mint")]
#[command(about = "Mint a compressed NFT on Solana", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the RPC endpoint.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Override the keypair file.
    #[arg(short, long)]
    keypair: Option<PathBuf>,

    /// Override the recipient address.
    #[arg(short, long)]
    recipient: Option<String>,

    /// Override the image to upload.
    #[arg(short, long)]
    image: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a tree, upload image and metadata, and mint (default)
    Run,
    /// Only create a merkle tree
    CreateTree,
    /// Upload a single file and print its URI
    Upload { file: PathBuf },
    /// Mint into an existing tree owned by the wallet
    Mint {
        #[arg(long)]
        tree: String,
        #[arg(long)]
        uri: String,
    },
    /// Print size, capacity and rent for the configured tree
    TreeInfo,
}

impl Cli {
    fn apply_overrides(&self, config: &mut MinterConfig) {
        if let Some(url) = &self.rpc_url {
            config.rpc.url = url.clone();
        }
        if let Some(keypair) = &self.keypair {
            config.wallet.keypair_path = Some(keypair.clone());
        }
        if let Some(recipient) = &self.recipient {
            config.nft.recipient = recipient.clone();
        }
        if let Some(image) = &self.image {
            config.nft.image_path = image.clone();
        }
    }

    /// Only the full run and `mint` need a recipient.
    fn needs_recipient(&self) -> bool {
        matches!(self.command, None | Some(Commands::Run) | Some(Commands::Mint { .. }))
    }
}

fn load(cli: &Cli) -> Result<MinterConfig, ConfigError> {
    let allow_missing = cli.config == Path::new(DEFAULT_CONFIG_PATH);
    let mut config = read_config_or_default(&cli.config, allow_missing)?;
    cli.apply_overrides(&mut config);

    if let Err(errors) = validate_config(&config) {
        let errors: Vec<_> = errors
            .into_iter()
            .filter(|e| cli.needs_recipient() || e.field != "nft.recipient")
            .collect();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
    }
    Ok(config)
}

async fn execute(cli: Cli, config: MinterConfig) -> Result<(), MintError> {
    let client = SolanaClient::new(config.rpc.clone())?;

    if let Some(Commands::TreeInfo) = cli.command {
        let params = TreeParams::from(&config.tree);
        let rent = match client
            .get_minimum_balance_for_rent_exemption(params.account_size())
            .await
        {
            Ok(rent) => Some(rent),
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch rent");
                None
            }
        };
        let info = json!({
            "max_depth": params.max_depth,
            "max_buffer_size": params.max_buffer_size,
            "canopy_depth": params.canopy_depth,
            "account_size": params.account_size(),
            "capacity": params.capacity(),
            "rent_lamports": rent,
        });
        println!("{}", pretty(&info));
        return Ok(());
    }

    let wallet = Wallet::load(&config.wallet)?;
    let sender = TxSender::new(client, wallet.clone());
    let uploader = IrysUploader::new(&config.uploader, wallet)?.with_funder(sender.clone());
    let pipeline = MintPipeline::new(config, sender, uploader);

    match cli.command {
        None | Some(Commands::Run) => {
            let report = pipeline.run().await?;
            println!("{}", pretty(&report));
        }
        Some(Commands::CreateTree) => {
            let tree = pipeline.create_tree().await?;
            println!(
                "{}",
                pretty(&json!({
                    "tree": tree.address.to_string(),
                    "signature": tree.signature.to_string(),
                }))
            );
        }
        Some(Commands::Upload { file }) => {
            let uploaded = pipeline.upload_file(&file).await?;
            println!("{}", uploaded.uri);
        }
        Some(Commands::Mint { tree, uri }) => {
            let tree = parse_pubkey(&tree)?;
            let signature = pipeline.mint(&tree, &uri).await?;
            println!("{}", signature);
        }
        Some(Commands::TreeInfo) => {}
    }
    Ok(())
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&Default::default());
            tracing::error!(error = %e, "An error occurred");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.observability);

    match execute(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "An error occurred");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::parse_from(["cnft-mint", "mint", "--tree", "T", "--uri", "U"]);
        assert!(matches!(cli.command, Some(Commands::Mint { .. })));
        assert!(cli.needs_recipient());

        let cli = Cli::parse_from(["cnft-mint", "upload", "pfp.jpg"]);
        assert!(!cli.needs_recipient());

        let cli = Cli::parse_from(["cnft-mint"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "cnft-mint",
            "--rpc-url",
            "http://127.0.0.1:8899",
            "--recipient",
            "GdZMkNLe1R1Uzcna8U4QYVxtVVWvE3QZqkMYdtbVsohY",
            "--image",
            "art.png",
        ]);
        let mut config = MinterConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.rpc.url, "http://127.0.0.1:8899");
        assert_eq!(config.nft.recipient, "GdZMkNLe1R1Uzcna8U4QYVxtVVWvE3QZqkMYdtbVsohY");
        assert_eq!(config.nft.image_path, PathBuf::from("art.png"));
    }

    #[test]
    fn test_upload_does_not_require_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mint.toml");
        std::fs::write(&path, "[rpc]\nurl = \"http://127.0.0.1:8899\"\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let cli = Cli::parse_from(["cnft-mint", "--config", path.as_str(), "upload", "x.png"]);
        assert!(load(&cli).is_ok());

        let cli = Cli::parse_from(["cnft-mint", "--config", path.as_str(), "run"]);
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! mint.toml
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (rpc url, keypair, recipient, image)
//!     → validation.rs (semantic checks)
//!     → MinterConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, read_config_or_default, ConfigError};
pub use schema::{
    AttributeConfig, MinterConfig, NftConfig, ObservabilityConfig, RpcConfig, TreeConfig,
    UploaderConfig, WalletConfig,
};
pub use validation::{validate_config, ValidationError};

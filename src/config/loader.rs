//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::MinterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MinterConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Parse a TOML file without validating it.
///
/// A missing file yields the built-in defaults when `allow_missing` is set,
/// so CLI overrides can still be applied before validation.
pub fn read_config_or_default(path: &Path, allow_missing: bool) -> Result<MinterConfig, ConfigError> {
    match read_config(path) {
        Err(ConfigError::Io(e)) if allow_missing && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Ok(MinterConfig::default())
        }
        other => other,
    }
}

fn read_config(path: &Path) -> Result<MinterConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [rpc]
            url = "http://127.0.0.1:8899"

            [nft]
            name = "howdy"
            recipient = "GdZMkNLe1R1Uzcna8U4QYVxtVVWvE3QZqkMYdtbVsohY"
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.rpc.url, "http://127.0.0.1:8899");
        assert_eq!(config.nft.name, "howdy");
    }

    #[test]
    fn test_load_reports_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[tree]\nmax_depth = 7\nmax_buffer_size = 17").unwrap();

        let err = load_config(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("tree:"));
        assert!(message.contains("nft.recipient: is required"));
    }

    #[test]
    fn test_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rpc\nurl = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = read_config_or_default(&path, true).unwrap();
        assert_eq!(config.tree.max_depth, 7);

        assert!(matches!(
            read_config_or_default(&path, false),
            Err(ConfigError::Io(_))
        ));
    }
}

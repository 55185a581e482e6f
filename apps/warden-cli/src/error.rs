use std::path::PathBuf;
use thiserror::Error;
use warden_authz::AuthzError;
use warden_config::ConfigError;
use warden_storage::StoreError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Authz(#[from] AuthzError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Lock error for worker '{name}': {reason}")]
    LockError { name: String, reason: String },

    #[error("Invalid worker name: {0:?} (expected [A-Za-z0-9_-]+)")]
    InvalidWorkerName(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RippleError>;

/// Returns true if `name` is usable as a worker / lock name.
pub fn is_valid_worker_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

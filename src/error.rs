//! Error types for the composition root.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large ({size} bytes, max {max})")]
    TooLarge { size: u64, max: u64 },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("document {0:?} already has an active engine")]
    AlreadyActive(String),
}

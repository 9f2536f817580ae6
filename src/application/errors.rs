//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Payment verification errors
///
/// Caught at the dispatch boundary and rendered as a user-visible warning;
/// never fatal to the process.
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// Session storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Configuration errors - fatal at startup
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

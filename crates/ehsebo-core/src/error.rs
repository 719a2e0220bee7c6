use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Exchange rate provider failed: {0}")]
    RateProvider(String),
    #[error("Remote mirror unavailable: {0}")]
    MirrorUnavailable(String),
}

impl CoreError {
    /// Returns `true` for failures of the durable medium, which callers may retry.
    pub fn is_storage(&self) -> bool {
        matches!(self, CoreError::StorageUnavailable(_))
    }
}

impl From<io::Error> for CoreError {
    fn from(err: io::Error) -> Self {
        CoreError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serde(err.to_string())
    }
}

//! Error types for the plateup_core library.

use crate::store::RecordKind;
use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for plateup_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Body measurement that is non-positive or physically impossible
    #[error("Invalid measurement: {0}")]
    InvalidMeasurement(String),

    /// Body measurement required by the formula is absent
    #[error("{0}")]
    MissingMeasurement(String),

    /// Session operation called from a state that forbids it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Opaque failure reported by a record store
    #[error("Store failure: {0}")]
    StoreFailure(String),

    /// A record the caller required does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: Uuid },
}

impl Error {
    /// True for failures that came from the record store.
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Error::StoreFailure(_))
    }
}

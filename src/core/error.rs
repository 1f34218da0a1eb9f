use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading configuration or processing documents.
///
/// Only [`NotaError::Config`] aborts a run. Everything else is caught at the
/// per-file boundary in the batch driver, counted, and logged, so a single
/// broken document never stops the rest of the folder.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NotaError {
    /// Configuration file missing, unreadable, or company entry absent.
    #[error("configuration error: {0}")]
    Config(String),

    /// An access key had the wrong length for the requested operation.
    #[error("access key must have {expected} digits, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// An access key contained a non-decimal character.
    #[error("access key contains non-digit character {0:?}")]
    InvalidKeyDigit(char),

    /// XML parsing or serialization failure.
    #[error("XML error: {0}")]
    Xml(String),

    /// Destination filename already exists and differs from the source.
    #[error("rename collision: {destination} already exists")]
    RenameCollision { destination: PathBuf },

    /// Underlying file-system failure on read, write, or rename.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Date string in the configuration could not be parsed as DD/MM/YYYY.
    #[error("invalid date {value:?}: {source}")]
    InvalidDate {
        value: String,
        source: chrono::ParseError,
    },
}

impl NotaError {
    /// Wrap a quick-xml error.
    pub(crate) fn xml(e: impl std::fmt::Display) -> Self {
        NotaError::Xml(e.to_string())
    }
}

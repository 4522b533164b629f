//! Error types for SIGMET volume decoding.

use thiserror::Error;

/// Result type for SIGMET parser operations.
pub type SigmetResult<T> = Result<T, SigmetError>;

/// Error types for SIGMET decoding.
#[derive(Error, Debug)]
pub enum SigmetError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A primitive field straddles a record boundary or runs past end of file
    #[error("Truncated record at offset {offset}: {needed} bytes needed")]
    TruncatedRecord { offset: u64, needed: usize },

    /// End of file reached while a radial still expected samples
    #[error("Truncated ray at offset {offset}: {produced} of {bins} bins decoded")]
    TruncatedRay {
        offset: u64,
        produced: usize,
        bins: usize,
    },

    /// Ingest data header names a data type outside 1-5
    #[error("Unknown data type code: {0}")]
    UnknownDataType(i16),

    /// Format discriminator at offset 24 is not 15
    #[error("Not a SIGMET raw volume (format discriminator {found}, expected 15)")]
    FormatMismatch { found: i16 },

    /// Header field holds a value the decoder cannot work with
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Compression prefix too short to hold the ray header
    #[error("Invalid ray prefix at offset {offset}: {words} words")]
    InvalidRayPrefix { offset: u64, words: usize },

    /// Section request with an unusable range
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Reader configuration rejected
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SigmetError {
    /// Create a truncated-record error.
    pub fn truncated(offset: u64, needed: usize) -> Self {
        Self::TruncatedRecord { offset, needed }
    }

    /// Create an invalid-header error.
    pub fn invalid_header(msg: impl Into<String>) -> Self {
        Self::InvalidHeader(msg.into())
    }

    /// Create an invalid-range error.
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }
}

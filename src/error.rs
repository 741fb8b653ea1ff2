//! Error handling for the ebivis ingestion core
//!
//! This module defines the error taxonomy and a Result alias for use
//! throughout the crate. Wire-level decode failures get their own enum so
//! callers (and tests) can assert exactly which kind occurred; everything
//! else folds into [`VisError`].

use std::net::SocketAddr;
use thiserror::Error;

/// Per-message decode failures
///
/// These are recoverable: the ingestion loop logs the error, drops the
/// message, and keeps reading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The payload had no characters at all, so no tag could be read
    #[error("empty payload")]
    EmptyPayload,

    /// The leading character was not one of the known message tags
    #[error("unknown message tag '{0}'")]
    UnknownTag(char),

    /// A retained token was not a valid numeric literal
    #[error("invalid numeric token '{token}'")]
    NumberFormat {
        /// The offending token, trimmed
        token: String,
    },

    /// A fixed-arity body had the wrong number of fields
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
}

/// Main error type for ebivis operations
#[derive(Error, Debug)]
pub enum VisError {
    /// Errors related to wire message decoding (per-message, recoverable)
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// A grid sample addressed a cell outside the configured dimensions
    #[error("grid coordinate ({x}, {y}) outside {width}x{height} grid")]
    OutOfRange {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    /// Errors on an established connection (connection-scoped)
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Failure to bind the listening socket (fatal at startup)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Errors related to configuration loading or validation
    #[error("configuration error: {0}")]
    Config(String),
}

impl VisError {
    /// True for errors the ingestion loop absorbs without dropping the
    /// connection (decode and apply failures)
    pub fn is_per_message(&self) -> bool {
        matches!(self, VisError::Protocol(_) | VisError::OutOfRange { .. })
    }
}

/// Result type alias for ebivis operations
pub type Result<T> = std::result::Result<T, VisError>;

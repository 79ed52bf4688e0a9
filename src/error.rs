//! This module defines the single, unified error type for the entire parq
//! library. It uses the `thiserror` crate to provide ergonomic, context-aware
//! error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParqError {
    // =========================================================================
    // === High-Level, Semantic Errors (Specific to our library's logic)
    // =========================================================================
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Unknown column in file footer: {0}")]
    UnknownColumn(String),

    #[error("File format error: {0}")]
    FormatError(String),

    // =========================================================================
    // === External Error Wrappers (Using #[from] for automatic conversion)
    // =========================================================================
    /// An error originating from the underlying I/O subsystem. Short reads
    /// surface here through `read_exact`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error from the Serde JSON library during footer serialization.
    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    // =========================================================================
    // === Low-Level Page/Kernel Errors
    // =========================================================================
    #[error("Snappy operation failed: {0}")]
    SnappyError(String),

    #[error("RLE decoding error: {0}")]
    RleDecodeError(String),

    #[error("LEB128 decoding error: {0}")]
    Leb128DecodeError(String),

    #[error("Plain decoding failed due to truncated buffer or data corruption")]
    PlainDecodeError,

    #[error("Bit-unpacking failed due to truncated buffer or data corruption")]
    BitpackDecodeError,

    /// A page header's value count disagrees with the definition levels the
    /// page actually carries.
    #[error("page reports {header} values but definition levels carry {levels}")]
    LevelPayloadMismatch { levels: usize, header: usize },

    #[error("failed to read column '{column}': {source}")]
    ColumnRead {
        column: String,
        #[source]
        source: Box<ParqError>,
    },
}

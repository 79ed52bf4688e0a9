//! This module contains the pure, stateless kernels for Snappy block
//! compression and decompression.
//!
//! Every data page payload passes through here as a single blob: for
//! required columns the encoded values, for optional columns the level
//! stream followed by the encoded present values. This module is a safe
//! wrapper around the `snap` crate with errors mapped into the unified
//! error type.

use crate::error::ParqError;

/// Compresses a page payload with the Snappy block format.
pub fn compress(input: &[u8]) -> Result<Vec<u8>, ParqError> {
    snap::raw::Encoder::new()
        .compress_vec(input)
        .map_err(|e| ParqError::SnappyError(e.to_string()))
}

/// Decompresses a Snappy block back into the page payload.
pub fn decompress(input: &[u8]) -> Result<Vec<u8>, ParqError> {
    snap::raw::Decoder::new()
        .decompress_vec(input)
        .map_err(|e| ParqError::SnappyError(e.to_string()))
}

//==================================================================================
// Unit Tests
//==================================================================================

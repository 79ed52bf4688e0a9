//! This module serves as the public API for the collection of all pure,
//! stateless encoding and decoding kernels.
//!
//! Each sub-module is a distinct byte-level transform composed by the column
//! and metadata layers into the full page format. Kernels never touch I/O
//! handles or bookkeeping state; they map slices to bytes and back.

//==================================================================================
// 1. Module Declarations
//==================================================================================

/// Plain encoding: little-endian fixed-width values and length-prefixed
/// UTF-8 strings.
pub mod plain;

/// LSB-first 1-bit packing for boolean columns.
pub mod bitpack;

/// Unsigned LEB128 varints, used for definition-level run headers.
pub mod leb128;

/// Run-length encoding of 0/1 definition levels.
pub mod rle;

/// Snappy block compression, applied to every page payload.
pub mod snappy;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
// Individual functions are not re-exported. The `column` and `metadata`
// modules are the designated consumers and call kernels via their full path
// (e.g. `kernels::plain::encode`). This keeps the dependency graph explicit.

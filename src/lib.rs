//! This file is the root of the `parq` crate.
//!
//! `parq` writes and reads Parquet-style columnar files for statically-typed
//! record streams. A caller describes a flat record shape as a set of column
//! buffers (one per field, each required or optional, bound to the record via
//! a pair of extract/inject adapters) and obtains:
//!
//! 1. A [`FileWriter`] that consumes records one at a time, buffers them
//!    column-wise, segments them into row groups and pages, and emits a valid
//!    file (magic, Snappy-compressed data pages, metadata footer).
//! 2. A [`FileReader`] that locates the column chunks through the footer,
//!    decompresses and decodes the pages, and yields the records back in the
//!    exact order they were written.
//!
//! The crate is layered: `kernels/` holds pure, stateless byte-level
//! transforms; `format` is the single source of truth for every on-disk
//! structure; `metadata` does all format-level bookkeeping; `column`,
//! `writer` and `reader` orchestrate the kernels into the row-group/page
//! state machine.

//==================================================================================
// 0. Constants
//==================================================================================
/// The crate version, automatically set from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//==================================================================================
// 1. Module Declarations
//==================================================================================
pub mod column;
pub mod config;
pub mod format;
pub mod kernels;
pub mod metadata;
pub mod reader;
pub mod writer;

mod error;

#[cfg(test)]
mod roundtrip_tests;

//==================================================================================
// 2. Public API Re-exports
//==================================================================================
pub use column::{Column, ColumnValue, OptionalColumn, ReadSeek, RequiredColumn};
pub use config::WriterOptions;
pub use error::ParqError;
pub use format::{PhysicalType, Position, Repetition, SchemaElement};
pub use metadata::Metadata;
pub use reader::FileReader;
pub use writer::FileWriter;

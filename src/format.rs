//! Defines all on-disk structures and constants for the parq file format.
//! This is the single source of truth for the file-level envelope (magic and
//! footer), the per-page framing, and the schema vocabulary shared by the
//! writer, the reader, and the metadata bookkeeping.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

//==================================================================================
// I. File-Level Envelope
//==================================================================================

/// The 4-byte marker bracketing a file: it opens the stream and closes it
/// again after the footer length.
pub const MAGIC: &[u8; 4] = b"PAR1";

/// On-disk byte layout:
///
/// ```text
/// MAGIC | data pages | footer (JSON) | footer length (i32 LE) | MAGIC
/// ```
///
/// The footer, containing the schema and the per-(row group, column) chunk
/// index that lets a reader locate every page.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileFooter {
    pub schema: Vec<SchemaElement>,
    pub num_rows: i64,
    pub row_groups: Vec<RowGroupMeta>,
    pub writer_version: String,
}

/// Metadata for one row group: a horizontal slab of records, stored as one
/// column chunk per schema field, in schema order.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RowGroupMeta {
    pub num_rows: i64,
    pub columns: Vec<ColumnChunkMeta>,
}

/// Physical location info for one column chunk. A chunk may span several
/// consecutive pages; `num_values` is the total across all of them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ColumnChunkMeta {
    /// Dotted path of the column in the schema. Flat schemas always carry a
    /// single segment; readers match on the last one.
    pub path_in_schema: Vec<String>,
    pub offset: i64,
    pub total_compressed_size: i64,
    pub num_values: i64,
}

/// Where a column chunk lives in the file, as handed to the reader:
/// byte offset of its first page header, total compressed size, and the
/// number of values to drain from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: i64,
    pub compressed_size: i64,
    pub num_values: i64,
}

//==================================================================================
// II. Schema Vocabulary
//==================================================================================

/// The physical storage type of a column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Bool,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Utf8,
}

/// Whether every record carries a value for the column, or only some do.
/// Optional columns store a 0/1 definition level per record.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
    Required,
    Optional,
}

/// One field of the flat record schema.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    pub name: String,
    pub physical_type: PhysicalType,
    pub repetition: Repetition,
}

//==================================================================================
// III. Page-Level Framing
//==================================================================================

/// Serialized byte length of a [`PageHeader`]: three `i32` words.
pub const PAGE_HEADER_LEN: usize = 12;

/// Fixed-size framing preceding every data page's compressed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub uncompressed_size: i32,
    pub compressed_size: i32,
    pub num_values: i32,
}

impl PageHeader {
    /// Writes the header as three little-endian `i32` words.
    pub fn write_to(&self, out: &mut dyn Write) -> std::io::Result<()> {
        out.write_all(&self.uncompressed_size.to_le_bytes())?;
        out.write_all(&self.compressed_size.to_le_bytes())?;
        out.write_all(&self.num_values.to_le_bytes())
    }

    /// Reads back a header written by [`PageHeader::write_to`].
    pub fn read_from<I: Read + ?Sized>(input: &mut I) -> std::io::Result<Self> {
        let mut buf = [0u8; PAGE_HEADER_LEN];
        input.read_exact(&mut buf)?;
        Ok(Self {
            uncompressed_size: i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            compressed_size: i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            num_values: i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
        })
    }
}

//==================================================================================
// IV. Unit Tests
//==================================================================================

//! In-memory column buffers and the per-type codec dispatch.
//!
//! One buffer exists per schema field. [`RequiredColumn`] holds values only;
//! [`OptionalColumn`] holds values plus a parallel 0/1 definition-level
//! track. Both are generic over the record type `R` and the physical value
//! type `T`, with per-type encoding dispatched through [`ColumnValue`]; the
//! row-group coordinator holds them erased as `Box<dyn Column<R>>` in schema
//! order.
//!
//! Lifecycle: a buffer is created empty, grown record-by-record through
//! `append`, drained to a page by `write_page` (leaving it empty for the
//! next row group), refilled from pages by `read_page`, and drained
//! record-by-record through `drain_one`. Appends and drains are FIFO.

use std::collections::VecDeque;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use log::trace;

use crate::error::ParqError;
use crate::format::{PhysicalType, Position, Repetition, SchemaElement};
use crate::kernels::{bitpack, plain, snappy};
use crate::metadata::Metadata;

/// Combined bound for page sources; the reader seeks between column chunks.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

//==================================================================================
// I. Per-Type Codec Dispatch
//==================================================================================

/// A value that can live in a column: it knows its physical type and how a
/// sequence of itself is laid out in a page payload.
pub trait ColumnValue: Clone + Sized {
    const PHYSICAL: PhysicalType;

    fn encode_seq(vals: &[Self], out: &mut Vec<u8>);
    /// Decodes exactly `n` values, advancing the cursor past them.
    fn decode_seq(cursor: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<Self>, ParqError>;
}

macro_rules! impl_column_value_plain {
    ($($t:ty => $physical:expr),+ $(,)?) => {
        $(
            impl ColumnValue for $t {
                const PHYSICAL: PhysicalType = $physical;

                fn encode_seq(vals: &[Self], out: &mut Vec<u8>) {
                    plain::encode(vals, out);
                }

                fn decode_seq(
                    cursor: &mut Cursor<&[u8]>,
                    n: usize,
                ) -> Result<Vec<Self>, ParqError> {
                    plain::decode(cursor, n)
                }
            }
        )+
    };
}

impl_column_value_plain!(
    i32 => PhysicalType::Int32,
    u32 => PhysicalType::Uint32,
    i64 => PhysicalType::Int64,
    u64 => PhysicalType::Uint64,
    f32 => PhysicalType::Float32,
    f64 => PhysicalType::Float64,
);

impl ColumnValue for bool {
    const PHYSICAL: PhysicalType = PhysicalType::Bool;

    fn encode_seq(vals: &[Self], out: &mut Vec<u8>) {
        bitpack::encode(vals, out);
    }

    fn decode_seq(cursor: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<Self>, ParqError> {
        bitpack::decode(cursor, n)
    }
}

impl ColumnValue for String {
    const PHYSICAL: PhysicalType = PhysicalType::Utf8;

    fn encode_seq(vals: &[Self], out: &mut Vec<u8>) {
        plain::encode_strings(vals, out);
    }

    fn decode_seq(cursor: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<Self>, ParqError> {
        plain::decode_strings(cursor, n)
    }
}

//==================================================================================
// II. The Erased Column Seam
//==================================================================================

/// The type-erased surface the row-group coordinator and the reader drive.
/// Implementations exist per (record type, physical type, repetition).
pub trait Column<R> {
    fn name(&self) -> &str;
    fn schema(&self) -> SchemaElement;

    /// Extracts the field from `rec` and pushes it onto the buffer.
    fn append(&mut self, rec: &R);

    /// Pops the head of the buffer and injects it into `rec`. A no-op on an
    /// empty buffer; the reader's row cursor bounds how often this is called.
    fn drain_one(&mut self, rec: &mut R);

    /// Encodes, compresses and writes everything buffered as one page,
    /// leaving the buffer empty.
    fn write_page(&mut self, out: &mut dyn Write, meta: &mut Metadata) -> Result<(), ParqError>;

    /// Reads pages at `pos` until the chunk's value count is satisfied,
    /// appending the reconstructed values to the buffer.
    fn read_page(
        &mut self,
        src: &mut dyn ReadSeek,
        meta: &Metadata,
        pos: &Position,
    ) -> Result<(), ParqError>;

    /// The number of logical records currently buffered.
    fn num_buffered(&self) -> usize;
}

//==================================================================================
// III. Shared Page Plumbing
//==================================================================================

/// Compresses a page payload and writes it behind its header.
fn write_data_page(
    out: &mut dyn Write,
    meta: &mut Metadata,
    column: &str,
    payload: &[u8],
    num_values: usize,
) -> Result<(), ParqError> {
    let compressed = snappy::compress(payload)?;
    meta.write_page_header(out, column, payload.len(), compressed.len(), num_values)?;
    out.write_all(&compressed)?;
    trace!(
        "page written: column={column} values={num_values} uncompressed={} compressed={}",
        payload.len(),
        compressed.len()
    );
    Ok(())
}

/// Seeks to a chunk and yields its pages' decompressed payloads one at a
/// time until `pos.num_values` values have been covered.
fn for_each_page<S: Read + Seek + ?Sized>(
    src: &mut S,
    meta: &Metadata,
    pos: &Position,
    mut visit: impl FnMut(usize, Vec<u8>) -> Result<(), ParqError>,
) -> Result<(), ParqError> {
    if pos.offset < 0 {
        return Err(ParqError::FormatError(format!(
            "negative chunk offset: {}",
            pos.offset
        )));
    }
    src.seek(SeekFrom::Start(pos.offset as u64))?;

    let mut values_read: i64 = 0;
    while values_read < pos.num_values {
        let header = meta.read_page_header(src)?;
        let mut compressed = vec![0u8; header.compressed_size as usize];
        src.read_exact(&mut compressed)?;
        let payload = snappy::decompress(&compressed)?;
        visit(header.num_values as usize, payload)?;
        values_read += header.num_values as i64;
    }
    Ok(())
}

//==================================================================================
// IV. Required Columns
//==================================================================================

/// Column buffer for a field every record carries.
pub struct RequiredColumn<R, T: ColumnValue> {
    name: String,
    vals: VecDeque<T>,
    extract: fn(&R) -> T,
    inject: fn(&mut R, T),
}

impl<R, T: ColumnValue> RequiredColumn<R, T> {
    pub fn new(name: impl Into<String>, extract: fn(&R) -> T, inject: fn(&mut R, T)) -> Self {
        Self {
            name: name.into(),
            vals: VecDeque::new(),
            extract,
            inject,
        }
    }
}

impl<R, T: ColumnValue> Column<R> for RequiredColumn<R, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> SchemaElement {
        SchemaElement {
            name: self.name.clone(),
            physical_type: T::PHYSICAL,
            repetition: Repetition::Required,
        }
    }

    fn append(&mut self, rec: &R) {
        self.vals.push_back((self.extract)(rec));
    }

    fn drain_one(&mut self, rec: &mut R) {
        if let Some(v) = self.vals.pop_front() {
            (self.inject)(rec, v);
        }
    }

    fn write_page(&mut self, out: &mut dyn Write, meta: &mut Metadata) -> Result<(), ParqError> {
        let count = self.vals.len();
        let mut payload = Vec::new();
        T::encode_seq(self.vals.make_contiguous(), &mut payload);
        write_data_page(out, meta, &self.name, &payload, count)?;
        self.vals.clear();
        Ok(())
    }

    fn read_page(
        &mut self,
        src: &mut dyn ReadSeek,
        meta: &Metadata,
        pos: &Position,
    ) -> Result<(), ParqError> {
        let vals = &mut self.vals;
        for_each_page(src, meta, pos, |num_values, payload| {
            let mut cursor = Cursor::new(&payload[..]);
            vals.extend(T::decode_seq(&mut cursor, num_values)?);
            Ok(())
        })
    }

    fn num_buffered(&self) -> usize {
        self.vals.len()
    }
}

//==================================================================================
// V. Optional Columns
//==================================================================================

/// Column buffer for a field only some records carry. The `defs` track holds
/// one 0/1 entry per appended record; `vals` holds present values only.
pub struct OptionalColumn<R, T: ColumnValue> {
    name: String,
    vals: VecDeque<T>,
    defs: VecDeque<u8>,
    extract: fn(&R) -> Option<T>,
    inject: fn(&mut R, Option<T>),
}

impl<R, T: ColumnValue> OptionalColumn<R, T> {
    pub fn new(
        name: impl Into<String>,
        extract: fn(&R) -> Option<T>,
        inject: fn(&mut R, Option<T>),
    ) -> Self {
        Self {
            name: name.into(),
            vals: VecDeque::new(),
            defs: VecDeque::new(),
            extract,
            inject,
        }
    }
}

impl<R, T: ColumnValue> Column<R> for OptionalColumn<R, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> SchemaElement {
        SchemaElement {
            name: self.name.clone(),
            physical_type: T::PHYSICAL,
            repetition: Repetition::Optional,
        }
    }

    fn append(&mut self, rec: &R) {
        match (self.extract)(rec) {
            Some(v) => {
                self.vals.push_back(v);
                self.defs.push_back(1);
            }
            None => self.defs.push_back(0),
        }
    }

    fn drain_one(&mut self, rec: &mut R) {
        let def = match self.defs.pop_front() {
            Some(d) => d,
            None => return,
        };
        let val = if def == 1 { self.vals.pop_front() } else { None };
        (self.inject)(rec, val);
    }

    fn write_page(&mut self, out: &mut dyn Write, meta: &mut Metadata) -> Result<(), ParqError> {
        let count = self.defs.len();
        let mut payload = Vec::new();
        meta.write_levels(&mut payload, self.defs.make_contiguous())?;
        T::encode_seq(self.vals.make_contiguous(), &mut payload);
        write_data_page(out, meta, &self.name, &payload, count)?;
        self.vals.clear();
        self.defs.clear();
        Ok(())
    }

    fn read_page(
        &mut self,
        src: &mut dyn ReadSeek,
        meta: &Metadata,
        pos: &Position,
    ) -> Result<(), ParqError> {
        let vals = &mut self.vals;
        let defs = &mut self.defs;
        for_each_page(src, meta, pos, |num_values, payload| {
            let mut cursor = Cursor::new(&payload[..]);
            let (page_defs, consumed) = meta.read_levels(&mut cursor)?;
            debug_assert_eq!(cursor.position() as usize, consumed);
            if page_defs.len() != num_values {
                return Err(ParqError::LevelPayloadMismatch {
                    levels: page_defs.len(),
                    header: num_values,
                });
            }

            // Only present records contribute to the value stream.
            let present = page_defs.iter().filter(|&&d| d == 1).count();
            vals.extend(T::decode_seq(&mut cursor, present)?);
            defs.extend(page_defs);
            Ok(())
        })
    }

    fn num_buffered(&self) -> usize {
        self.defs.len()
    }
}

//==================================================================================
// VI. Unit Tests
//==================================================================================

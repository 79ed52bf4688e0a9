//! The metadata collaborator: all format-level bookkeeping for a file.
//!
//! A `Metadata` instance is shared by the writer side (page header emission,
//! offset accounting, row-group lifecycle, footer serialization) and the
//! reader side (footer parsing, page header parsing, chunk positions). The
//! column buffers treat it as an opaque surface; they never touch offsets or
//! the footer layout themselves.
//!
//! Level streams are framed here too: a 4-byte little-endian body length
//! followed by the run-encoded levels, so that a reader can recover the
//! exact byte boundary between levels and values inside a page payload.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom, Write};
use std::mem;

use log::debug;

use crate::error::ParqError;
use crate::format::{
    ColumnChunkMeta, FileFooter, PageHeader, Position, RowGroupMeta, SchemaElement, MAGIC,
    PAGE_HEADER_LEN,
};
use crate::kernels::rle;

//==================================================================================
// I. Write-Side Accounting
//==================================================================================

/// Running totals for one column chunk of the row group being written.
#[derive(Debug, Clone, Copy, Default)]
struct ChunkAccount {
    offset: i64,
    total_compressed_size: i64,
    num_values: i64,
    pages: u32,
}

#[derive(Debug, Clone, Default)]
struct RowGroupAccount {
    columns: Vec<ChunkAccount>,
}

impl RowGroupAccount {
    fn new(num_columns: usize) -> Self {
        Self {
            columns: vec![ChunkAccount::default(); num_columns],
        }
    }

    fn num_rows(&self) -> i64 {
        self.columns.first().map_or(0, |c| c.num_values)
    }

    fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.pages == 0)
    }
}

//==================================================================================
// II. The Metadata Surface
//==================================================================================

#[derive(Debug)]
pub struct Metadata {
    schema: Vec<SchemaElement>,
    sealed: Vec<RowGroupAccount>,
    current: RowGroupAccount,
    /// Byte offset of the next page header, starting past the leading magic.
    offset: i64,
    /// Populated by `read_footer` (reader side) or `footer` (writer side).
    footer: Option<FileFooter>,
}

impl Metadata {
    /// Validates the schema (non-empty, unique names) and begins accounting
    /// for the first row group.
    pub fn new(schema: Vec<SchemaElement>) -> Result<Self, ParqError> {
        let mut seen = HashMap::with_capacity(schema.len());
        for field in &schema {
            if field.name.is_empty() {
                return Err(ParqError::InvalidSchema(
                    "field names must be non-empty".to_string(),
                ));
            }
            if seen.insert(field.name.clone(), ()).is_some() {
                return Err(ParqError::InvalidSchema(format!(
                    "duplicate field name: {}",
                    field.name
                )));
            }
        }

        let current = RowGroupAccount::new(schema.len());
        Ok(Self {
            schema,
            sealed: Vec::new(),
            current,
            offset: MAGIC.len() as i64,
            footer: None,
        })
    }

    pub fn schema(&self) -> &[SchemaElement] {
        &self.schema
    }

    /// Seals the accounting for the row group in progress and begins a new
    /// one with the same schema.
    pub fn start_row_group(&mut self) {
        let done = mem::replace(&mut self.current, RowGroupAccount::new(self.schema.len()));
        self.sealed.push(done);
    }

    //------------------------------------------------------------------------------
    // Page headers
    //------------------------------------------------------------------------------

    /// Emits a page header for `column` and folds the page into the current
    /// row group's chunk accounting. The caller writes the compressed
    /// payload immediately after.
    pub fn write_page_header(
        &mut self,
        out: &mut dyn Write,
        column: &str,
        uncompressed_size: usize,
        compressed_size: usize,
        num_values: usize,
    ) -> Result<(), ParqError> {
        let idx = self
            .schema
            .iter()
            .position(|f| f.name == column)
            .ok_or_else(|| ParqError::UnknownColumn(column.to_string()))?;

        PageHeader {
            uncompressed_size: uncompressed_size as i32,
            compressed_size: compressed_size as i32,
            num_values: num_values as i32,
        }
        .write_to(out)?;

        let chunk = &mut self.current.columns[idx];
        if chunk.pages == 0 {
            chunk.offset = self.offset;
        }
        chunk.total_compressed_size += (PAGE_HEADER_LEN + compressed_size) as i64;
        chunk.num_values += num_values as i64;
        chunk.pages += 1;

        self.offset += (PAGE_HEADER_LEN + compressed_size) as i64;
        Ok(())
    }

    /// Parses one page header, validating that the recorded sizes are sane.
    pub fn read_page_header<I: Read + ?Sized>(&self, input: &mut I) -> Result<PageHeader, ParqError> {
        let header = PageHeader::read_from(input)?;
        if header.uncompressed_size < 0 || header.compressed_size < 0 || header.num_values < 0 {
            return Err(ParqError::FormatError(format!(
                "negative size in page header: {header:?}"
            )));
        }
        Ok(header)
    }

    //------------------------------------------------------------------------------
    // Definition levels
    //------------------------------------------------------------------------------

    /// Writes a framed level stream: `i32` LE body length, then the
    /// run-encoded levels.
    ///
    /// # Returns
    /// The total number of bytes written, framing included.
    pub fn write_levels(&self, out: &mut dyn Write, defs: &[u8]) -> Result<usize, ParqError> {
        let mut body = Vec::new();
        rle::encode(defs, &mut body);
        out.write_all(&(body.len() as i32).to_le_bytes())?;
        out.write_all(&body)?;
        Ok(4 + body.len())
    }

    /// Reads back a framed level stream.
    ///
    /// # Returns
    /// The level sequence and the number of bytes consumed from `input`,
    /// framing included. The consumed count is what lets the caller find the
    /// value payload that follows the levels.
    pub fn read_levels<I: Read + ?Sized>(&self, input: &mut I) -> Result<(Vec<u8>, usize), ParqError> {
        let mut len_buf = [0u8; 4];
        input.read_exact(&mut len_buf)?;
        let body_len = i32::from_le_bytes(len_buf);
        if body_len < 0 {
            return Err(ParqError::FormatError(format!(
                "negative level stream length: {body_len}"
            )));
        }

        let mut body = vec![0u8; body_len as usize];
        input.read_exact(&mut body)?;
        let levels = rle::decode(&body)?;
        Ok((levels, 4 + body_len as usize))
    }

    //------------------------------------------------------------------------------
    // Footer
    //------------------------------------------------------------------------------

    /// Seals the last row group and writes the footer followed by its `i32`
    /// LE byte length. The trailing magic is the caller's responsibility,
    /// as the leading one was.
    pub fn footer(&mut self, out: &mut dyn Write) -> Result<(), ParqError> {
        self.start_row_group();

        let row_groups: Vec<RowGroupMeta> = self
            .sealed
            .iter()
            .filter(|rg| !rg.is_empty())
            .map(|rg| RowGroupMeta {
                num_rows: rg.num_rows(),
                columns: rg
                    .columns
                    .iter()
                    .zip(&self.schema)
                    .map(|(chunk, field)| ColumnChunkMeta {
                        path_in_schema: vec![field.name.clone()],
                        offset: chunk.offset,
                        total_compressed_size: chunk.total_compressed_size,
                        num_values: chunk.num_values,
                    })
                    .collect(),
            })
            .collect();

        let footer = FileFooter {
            schema: self.schema.clone(),
            num_rows: row_groups.iter().map(|rg| rg.num_rows).sum(),
            row_groups,
            writer_version: crate::VERSION.to_string(),
        };

        let bytes = serde_json::to_vec(&footer)?;
        out.write_all(&bytes)?;
        out.write_all(&(bytes.len() as i32).to_le_bytes())?;
        debug!(
            "footer written: {} row groups, {} rows, {} bytes",
            footer.row_groups.len(),
            footer.num_rows,
            bytes.len()
        );

        self.footer = Some(footer);
        Ok(())
    }

    /// Parses the footer from the tail of `input`, verifying the envelope
    /// magic at both ends.
    pub fn read_footer<S: Read + Seek>(&mut self, input: &mut S) -> Result<(), ParqError> {
        let mut magic = [0u8; 4];
        input.seek(SeekFrom::Start(0))?;
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ParqError::FormatError(
                "missing leading magic marker".to_string(),
            ));
        }

        input.seek(SeekFrom::End(-8))?;
        let mut len_buf = [0u8; 4];
        input.read_exact(&mut len_buf)?;
        input.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(ParqError::FormatError(
                "missing trailing magic marker".to_string(),
            ));
        }

        let footer_len = i32::from_le_bytes(len_buf);
        if footer_len < 0 {
            return Err(ParqError::FormatError(format!(
                "negative footer length: {footer_len}"
            )));
        }

        input.seek(SeekFrom::End(-8 - footer_len as i64))?;
        let mut bytes = vec![0u8; footer_len as usize];
        input.read_exact(&mut bytes)?;

        let footer: FileFooter = serde_json::from_slice(&bytes)?;
        debug!(
            "footer read: {} row groups, {} rows (writer {})",
            footer.row_groups.len(),
            footer.num_rows,
            footer.writer_version
        );
        self.footer = Some(footer);
        Ok(())
    }

    //------------------------------------------------------------------------------
    // Reader-side accessors
    //------------------------------------------------------------------------------

    /// Total record count: from the footer once one has been written or
    /// read, otherwise from the accounting in progress.
    pub fn rows(&self) -> i64 {
        match &self.footer {
            Some(f) => f.num_rows,
            None => {
                self.sealed.iter().map(|rg| rg.num_rows()).sum::<i64>() + self.current.num_rows()
            }
        }
    }

    pub fn row_groups(&self) -> &[RowGroupMeta] {
        match &self.footer {
            Some(f) => &f.row_groups,
            None => &[],
        }
    }

    /// Per-column chunk positions, one per row group, keyed by the last
    /// path-in-schema segment.
    pub fn offsets(&self) -> HashMap<String, Vec<Position>> {
        let mut out: HashMap<String, Vec<Position>> = HashMap::new();
        for rg in self.row_groups() {
            for col in &rg.columns {
                if let Some(name) = col.path_in_schema.last() {
                    out.entry(name.clone()).or_default().push(Position {
                        offset: col.offset,
                        compressed_size: col.total_compressed_size,
                        num_values: col.num_values,
                    });
                }
            }
        }
        out
    }
}

//==================================================================================
// III. Unit Tests
//==================================================================================

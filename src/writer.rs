//! The file writer: row-group coordination and the file envelope.
//!
//! A [`FileWriter`] owns the output sink exclusively, wrapped in a byte
//! counter. Records accumulate column-wise in an in-memory row group; when
//! it reaches `max_page_size` records, further records spill into additional
//! row-group buffers. `write` flushes the whole chain and seals it as one
//! footer row group; the outer loop runs over schema columns and the inner
//! loop over row groups, so all of a column's pages for one flush land
//! consecutively on disk. `close` consumes the writer, emitting the footer
//! and the trailing magic.
//!
//! Buffered records are not flushed implicitly: call [`FileWriter::write`]
//! before [`FileWriter::close`].

use std::io::Write;

use log::{debug, warn};

use crate::column::Column;
use crate::config::WriterOptions;
use crate::error::ParqError;
use crate::format::MAGIC;
use crate::metadata::Metadata;

//==================================================================================
// I. Counting Sink
//==================================================================================

/// Wraps the output sink and tracks the number of bytes emitted.
pub struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W> CountingWriter<W> {
    fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

//==================================================================================
// II. Row-Group Buffers
//==================================================================================

struct RowGroupBuf<R> {
    columns: Vec<Box<dyn Column<R>>>,
    len: usize,
}

//==================================================================================
// III. The Writer
//==================================================================================

pub struct FileWriter<R, W: Write> {
    sink: CountingWriter<W>,
    columns_fn: Box<dyn Fn() -> Vec<Box<dyn Column<R>>>>,
    /// The open row-group chain. Never empty; only the last entry accepts
    /// records, all earlier ones are full.
    groups: Vec<RowGroupBuf<R>>,
    max_page_size: usize,
    meta: Metadata,
}

impl<R, W: Write> FileWriter<R, W> {
    /// Emits the leading magic and prepares the first row group.
    ///
    /// `columns_fn` builds one column buffer per schema field, in schema
    /// order; it is invoked again whenever an overflow row group is opened.
    pub fn new<F>(sink: W, columns_fn: F, options: WriterOptions) -> Result<Self, ParqError>
    where
        F: Fn() -> Vec<Box<dyn Column<R>>> + 'static,
    {
        let columns = columns_fn();
        let schema = columns.iter().map(|c| c.schema()).collect();
        let meta = Metadata::new(schema)?;

        let mut sink = CountingWriter::new(sink);
        sink.write_all(MAGIC)?;

        Ok(Self {
            sink,
            columns_fn: Box::new(columns_fn),
            groups: vec![RowGroupBuf { columns, len: 0 }],
            max_page_size: options.max_page_size,
            meta,
        })
    }

    /// The number of bytes emitted to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.sink.bytes_written()
    }

    /// The number of records buffered and not yet flushed.
    pub fn buffered(&self) -> usize {
        self.groups.iter().map(|g| g.len).sum()
    }

    /// Appends one record, routing it into the open row group and opening a
    /// fresh one when the current is full.
    pub fn add(&mut self, rec: &R) {
        let needs_new = match self.groups.last() {
            Some(g) => g.len >= self.max_page_size,
            None => true,
        };
        if needs_new {
            self.groups.push(RowGroupBuf {
                columns: (self.columns_fn)(),
                len: 0,
            });
        }

        if let Some(group) = self.groups.last_mut() {
            for col in &mut group.columns {
                col.append(rec);
            }
            group.len += 1;
        }
    }

    /// Flushes every buffered row group as one footer row group: for each
    /// column in schema order, that column's page is written for every row
    /// group in the chain before the next column starts. A flush with
    /// nothing buffered is a no-op.
    pub fn write(&mut self) -> Result<(), ParqError> {
        let rows = self.buffered();
        if rows == 0 {
            return Ok(());
        }

        // Every column of a row group must have seen every record.
        for group in &self.groups {
            for col in &group.columns {
                debug_assert_eq!(
                    col.num_buffered(),
                    group.len,
                    "column '{}' out of step with its row group",
                    col.name()
                );
            }
        }

        let num_groups = self.groups.len();
        let num_columns = self.groups.first().map_or(0, |g| g.columns.len());
        for i in 0..num_columns {
            for group in self.groups.iter_mut() {
                if let Some(col) = group.columns.get_mut(i) {
                    col.write_page(&mut self.sink, &mut self.meta)?;
                }
            }
        }

        self.groups.truncate(1);
        if let Some(group) = self.groups.first_mut() {
            group.len = 0;
        }
        self.meta.start_row_group();
        debug!(
            "flushed {rows} rows in {num_groups} row groups ({} bytes emitted so far)",
            self.sink.bytes_written()
        );
        Ok(())
    }

    /// Emits the footer and the trailing magic, returning the sink.
    pub fn close(mut self) -> Result<W, ParqError> {
        let buffered = self.buffered();
        if buffered > 0 {
            warn!("closing with {buffered} buffered records that were never flushed");
        }

        self.meta.footer(&mut self.sink)?;
        self.sink.write_all(MAGIC)?;
        debug!(
            "file closed: {} rows, {} bytes",
            self.meta.rows(),
            self.sink.bytes_written()
        );
        Ok(self.sink.into_inner())
    }
}

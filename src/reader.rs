//! The file reader: footer resolution, page dispatch, and the record
//! iterator.
//!
//! Construction does all the heavy lifting: the footer is parsed from the
//! file's tail, every column chunk of every row group is located through the
//! footer's positions, and the pages are decompressed and decoded into the
//! matching column buffers. Iteration afterwards is pure in-memory draining:
//! `next` advances the row cursor and `scan` pops one value (or absence) out
//! of every column into the caller's record.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use log::debug;

use crate::column::Column;
use crate::error::ParqError;
use crate::format::RowGroupMeta;
use crate::metadata::Metadata;

pub struct FileReader<R, S: Read + Seek> {
    source: S,
    columns: Vec<Box<dyn Column<R>>>,
    meta: Metadata,
    cur: i64,
    rows: i64,
}

impl<R, S: Read + Seek> FileReader<R, S> {
    /// Parses the footer and loads every column chunk into the supplied
    /// column buffers (one per schema field, in schema order).
    ///
    /// Fails if the envelope is malformed, if the footer names a column the
    /// supplied buffers do not cover, or if any page fails to decode.
    pub fn new(mut source: S, columns: Vec<Box<dyn Column<R>>>) -> Result<Self, ParqError> {
        let mut columns = columns;
        let schema = columns.iter().map(|c| c.schema()).collect();
        let mut meta = Metadata::new(schema)?;
        meta.read_footer(&mut source)?;

        let rows = meta.rows();
        let offsets = meta.offsets();
        let row_groups: Vec<RowGroupMeta> = meta.row_groups().to_vec();

        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            index.insert(col.name().to_owned(), i);
        }

        source.seek(SeekFrom::Start(4))?;
        for (rg_idx, rg) in row_groups.iter().enumerate() {
            for chunk in &rg.columns {
                let name = chunk.path_in_schema.last().ok_or_else(|| {
                    ParqError::FormatError("footer column with empty path_in_schema".to_string())
                })?;
                let col_idx = *index
                    .get(name)
                    .ok_or_else(|| ParqError::UnknownColumn(name.clone()))?;
                let pos = offsets
                    .get(name)
                    .and_then(|positions| positions.get(rg_idx))
                    .ok_or_else(|| {
                        ParqError::FormatError(format!(
                            "missing position for column '{name}' in row group {rg_idx}"
                        ))
                    })?;

                columns[col_idx]
                    .read_page(&mut source, &meta, pos)
                    .map_err(|e| ParqError::ColumnRead {
                        column: name.clone(),
                        source: Box::new(e),
                    })?;
            }
        }

        debug!("opened file: {rows} rows in {} row groups", row_groups.len());
        Ok(Self {
            source,
            columns,
            meta,
            cur: 0,
            rows,
        })
    }

    /// The total number of records in the file.
    pub fn rows(&self) -> i64 {
        self.rows
    }

    /// Advances the row cursor. Returns `false` once every record has been
    /// visited.
    pub fn next(&mut self) -> bool {
        if self.cur >= self.rows {
            return false;
        }
        self.cur += 1;
        true
    }

    /// Drains the current record out of every column buffer into `rec`.
    pub fn scan(&mut self, rec: &mut R) {
        for col in &mut self.columns {
            col.drain_one(rec);
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Returns the input handle.
    pub fn into_inner(self) -> S {
        self.source
    }
}

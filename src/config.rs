//! Writer-side configuration.
//!
//! The options struct is designed to be created once at the application
//! boundary (directly, or deserialized from a user's config file) and handed
//! to [`crate::FileWriter::new`].

use serde::{Deserialize, Serialize};

/// Tuning knobs for a [`crate::FileWriter`].
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct WriterOptions {
    /// The number of records per row group. Each row group stores one page
    /// per column, so this is also the page row count. Records beyond the
    /// limit accumulate in further in-memory row groups until the next flush.
    pub max_page_size: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            max_page_size: 1000,
        }
    }
}

impl WriterOptions {
    pub fn with_max_page_size(mut self, rows: usize) -> Self {
        self.max_page_size = rows;
        self
    }
}

//! This module contains the pure, stateless kernels for run-length encoding
//! of definition levels.
//!
//! A definition-level stream is a sequence of 0/1 bytes, one per record of an
//! optional column. Such streams are dominated by long runs (mostly-present
//! or mostly-null columns), so the on-disk format is a sequence of
//! `(LEB128 header, level byte)` pairs with `header = run_length << 1`. The
//! low header bit is reserved and always zero for a run.
//!
//! The 4-byte length framing that bounds a level stream inside a page payload
//! belongs to the metadata layer, not to this kernel.

use std::io::Cursor;

use crate::error::ParqError;
use crate::kernels::leb128;

/// Encodes a level sequence as `(LEB128(run_length << 1), level)` runs.
pub fn encode(levels: &[u8], out: &mut Vec<u8>) {
    if levels.is_empty() {
        return;
    }

    let mut current = levels[0];
    let mut run: u64 = 1;
    for &level in &levels[1..] {
        if level == current {
            run += 1;
        } else {
            leb128::encode_val(run << 1, out);
            out.push(current);
            current = level;
            run = 1;
        }
    }
    leb128::encode_val(run << 1, out);
    out.push(current);
}

/// Decodes an entire run-encoded buffer back into the level sequence.
pub fn decode(bytes: &[u8]) -> Result<Vec<u8>, ParqError> {
    let mut cursor = Cursor::new(bytes);
    let mut out = Vec::new();

    while (cursor.position() as usize) < bytes.len() {
        let (header, _) = leb128::decode_val(&mut cursor)?;
        if header & 1 != 0 {
            return Err(ParqError::RleDecodeError(
                "bit-packed runs are not used for definition levels".to_string(),
            ));
        }
        let run = header >> 1;

        let pos = cursor.position() as usize;
        if pos >= bytes.len() {
            return Err(ParqError::RleDecodeError(
                "truncated run: missing level byte".to_string(),
            ));
        }
        let level = bytes[pos];
        cursor.set_position((pos + 1) as u64);

        if level > 1 {
            return Err(ParqError::RleDecodeError(format!(
                "definition level out of range: {level}"
            )));
        }
        for _ in 0..run {
            out.push(level);
        }
    }

    Ok(out)
}

//==================================================================================
// Unit Tests
//==================================================================================

//! This module contains the pure, stateless kernels for 1-bit packing of
//! boolean sequences.
//!
//! Value `i` occupies bit `i % 8` of byte `i / 8` (LSB first); trailing bits
//! of the final byte are zero. A sequence of N values occupies exactly
//! `(N + 7) / 8` bytes.

use std::io::Cursor;

use crate::error::ParqError;

/// Packs a boolean slice into bytes, LSB first.
pub fn encode(vals: &[bool], out: &mut Vec<u8>) {
    let start = out.len();
    out.resize(start + (vals.len() + 7) / 8, 0);
    for (i, &v) in vals.iter().enumerate() {
        if v {
            out[start + i / 8] |= 1 << (i % 8);
        }
    }
}

/// Unpacks exactly `n` booleans, advancing the cursor past the
/// `(n + 7) / 8` bytes that carry them.
pub fn decode(cursor: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<bool>, ParqError> {
    let bytes = *cursor.get_ref();
    let start = cursor.position() as usize;
    let need = (n + 7) / 8;
    if bytes.len() < start + need {
        return Err(ParqError::BitpackDecodeError);
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        out.push(bytes[start + i / 8] & (1 << (i % 8)) != 0);
    }
    cursor.set_position((start + need) as u64);
    Ok(out)
}

//==================================================================================
// Unit Tests
//==================================================================================

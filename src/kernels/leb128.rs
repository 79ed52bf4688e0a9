//! This module contains the pure, stateless kernels for LEB128
//! (Little-Endian Base 128) variable-length run headers.
//!
//! A continuation bit stores the header in the minimum number of full
//! bytes. The RLE kernel is the only consumer: most definition-level runs
//! are short, but a fully-null or fully-present page produces one very long
//! run, so a fixed-width header would waste most of its bytes.

use std::io::Cursor;

use crate::error::ParqError;

/// Encodes a run header into a LEB128 byte sequence.
pub fn encode_val(mut value: u64, buffer: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buffer.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decodes a run header from a LEB128 byte stream.
///
/// Reads from the `cursor` until a byte without the continuation bit is
/// found, assembling the header from 7-bit payloads.
///
/// # Returns
/// The decoded value and the number of bytes read.
pub fn decode_val(cursor: &mut Cursor<&[u8]>) -> Result<(u64, usize), ParqError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;
    let mut bytes_read = 0;

    loop {
        let pos = cursor.position() as usize;
        if pos >= cursor.get_ref().len() {
            return Err(ParqError::Leb128DecodeError(
                "Unexpected end of buffer".to_string(),
            ));
        }
        let byte = cursor.get_ref()[pos];
        cursor.set_position((pos + 1) as u64);
        bytes_read += 1;

        result |= u64::from(byte & 0x7F) << shift;

        if byte & 0x80 == 0 {
            return Ok((result, bytes_read));
        }

        shift += 7;
        if shift >= u64::BITS {
            return Err(ParqError::Leb128DecodeError(
                "Integer overflow during decoding".to_string(),
            ));
        }
    }
}

//==================================================================================
// Unit Tests
//==================================================================================

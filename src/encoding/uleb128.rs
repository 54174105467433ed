//! Little-endian base-128 varint, used for hybrid RLE/bit-packed run headers.

use crate::error::{Error, Result};

/// Decodes one varint from the front of `values`. Returns the decoded value and the number of
/// bytes consumed.
pub fn decode(values: &[u8]) -> Result<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;

    let mut consumed = 0;
    for byte in values {
        consumed += 1;
        if shift >= 64 {
            return Err(Error::TruncatedInput(
                "varint longer than 64 bits".to_string(),
            ));
        }
        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, consumed));
        }
        shift += 7;
    }
    Err(Error::TruncatedInput(
        "varint header truncated before a terminating byte".to_string(),
    ))
}

/// Encodes `value` as a varint, appending bytes to `out`.
pub fn encode(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

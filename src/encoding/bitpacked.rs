//! Byte-level LSB-first bit packing for widths `0..=3`.
//!
//! Real Parquet bit-packing runs up to width 64 with a SIMD-oriented block codec; the level
//! codec this crate needs never exceeds width 3, so a hand-rolled byte-at-a-time packer is the
//! right scale here rather than pulling in that generality.

use crate::error::{Error, Result};

const MAX_WIDTH: u8 = 3;

/// Packs `values` (each required to fit in `width` bits) into bytes, 8 values per group,
/// LSB-first within each byte and across the group. `values.len()` must be a multiple of 8; the
/// hybrid-RLE writer is responsible for zero-padding a partial tail before calling this.
pub fn pack(values: &[u32], width: u8, out: &mut Vec<u8>) -> Result<()> {
    if width > MAX_WIDTH {
        return Err(Error::UnsupportedWidth(width));
    }
    debug_assert_eq!(values.len() % 8, 0);
    if width == 0 {
        return Ok(());
    }
    for group in values.chunks(8) {
        let mut bit_buffer: u64 = 0;
        for (i, v) in group.iter().enumerate() {
            bit_buffer |= (*v as u64) << (i as u32 * width as u32);
        }
        let num_bytes = width as usize; // 8 values * width bits / 8 bits-per-byte
        let bytes = bit_buffer.to_le_bytes();
        out.extend_from_slice(&bytes[..num_bytes]);
    }
    Ok(())
}

/// Unpacks `num_values` values of `width` bits each from `data`, LSB-first. `data` must hold at
/// least `ceil(num_values / 8) * width` bytes.
pub fn unpack(data: &[u8], num_values: usize, width: u8) -> Result<Vec<u32>> {
    if width > MAX_WIDTH {
        return Err(Error::UnsupportedWidth(width));
    }
    if width == 0 {
        return Ok(vec![0; num_values]);
    }
    let bytes_per_group = width as usize;
    let num_groups = crate::encoding::ceil8(num_values);
    if data.len() < num_groups * bytes_per_group {
        return Err(Error::TruncatedInput(format!(
            "bit-packed block needs {} bytes, only {} available",
            num_groups * bytes_per_group,
            data.len()
        )));
    }

    let mut out = Vec::with_capacity(num_groups * 8);
    let mask = (1u64 << width) - 1;
    for group in data.chunks(bytes_per_group).take(num_groups) {
        let mut buf = [0u8; 8];
        buf[..group.len()].copy_from_slice(group);
        let bit_buffer = u64::from_le_bytes(buf);
        for i in 0..8 {
            let v = (bit_buffer >> (i as u32 * width as u32)) & mask;
            out.push(v as u32);
        }
    }
    out.truncate(num_values);
    Ok(out)
}

//! Value and level codecs: primitive PLAIN encoding lives in [`crate::page`] alongside the rest
//! of page framing; this module holds the building blocks the level codec is assembled from.

use std::convert::TryInto;

pub mod bitpacked;
pub mod hybrid_rle;
pub mod uleb128;

/// The two encodings this crate's pages ever declare: `PLAIN` for values, `RLE` for
/// definition/repetition levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Plain,
    Rle,
}

impl From<Encoding> for parquet_format_safe::Encoding {
    fn from(e: Encoding) -> Self {
        match e {
            Encoding::Plain => parquet_format_safe::Encoding::PLAIN,
            Encoding::Rle => parquet_format_safe::Encoding::RLE,
        }
    }
}

/// Reads a 4-byte little-endian length prefix from the front of `values`.
///
/// # Panics
/// Panics if `values.len() < 4`.
pub fn get_length(values: &[u8]) -> u32 {
    u32::from_le_bytes(values[0..4].try_into().unwrap())
}

/// Ceil of `value / 8`, the number of 8-value groups needed to hold `value` bit-packed entries.
#[inline]
pub fn ceil8(value: usize) -> usize {
    value / 8 + ((value % 8 != 0) as usize)
}

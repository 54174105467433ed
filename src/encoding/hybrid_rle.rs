//! Hybrid RLE / bit-packed encoding for definition and repetition levels.
//!
//! A run of repeated values is encoded as either an RLE run (a count and one value) or a
//! bit-packed run (a count of 8-value groups, each group packed at the column's bit width).
//! Either kind is legal for the decoder to accept in any order; the writer in this module picks
//! RLE whenever 8 or more equal values are pending, bit-packed groups otherwise.

use super::{bitpacked, ceil8, uleb128};
use crate::error::{Error, Result};

const MAX_WIDTH: u8 = 3;

/// Encodes `values` (each `< 2^width`) as a sequence of RLE/bit-packed runs, with no length
/// prefix. `width` must be `0..=3`.
pub fn encode_levels(values: &[u16], width: u8) -> Result<Vec<u8>> {
    if width > MAX_WIDTH {
        return Err(Error::UnsupportedWidth(width));
    }
    let mut out = Vec::new();
    if width == 0 {
        return Ok(out);
    }

    let mut i = 0;
    while i < values.len() {
        let run_len = equal_run_len(values, i);
        if run_len >= 8 {
            uleb128::encode((run_len as u64) << 1, &mut out);
            out.push(values[i] as u8);
            i += run_len;
            continue;
        }

        // Accumulate a bit-packed block until a long equal run begins (that run becomes its own
        // RLE run on the next outer iteration) or input is exhausted.
        let mut group: Vec<u32> = Vec::new();
        while i < values.len() && equal_run_len(values, i) < 8 {
            group.push(values[i] as u32);
            i += 1;
        }
        let pad = (8 - group.len() % 8) % 8;
        group.resize(group.len() + pad, 0);

        let num_groups = group.len() / 8;
        uleb128::encode(((num_groups as u64) << 1) | 1, &mut out);
        bitpacked::pack(&group, width, &mut out)?;
    }
    Ok(out)
}

/// Length of the run of values equal to `values[start]`, starting at `start`.
fn equal_run_len(values: &[u16], start: usize) -> usize {
    let v = values[start];
    values[start..].iter().take_while(|&&x| x == v).count()
}

/// Decodes exactly `num_values` levels from a run-encoded block with no length prefix.
pub fn decode_levels(data: &[u8], width: u8, num_values: usize) -> Result<Vec<u16>> {
    if width > MAX_WIDTH {
        return Err(Error::UnsupportedWidth(width));
    }
    if width == 0 {
        return Ok(vec![0; num_values]);
    }

    let mut out = Vec::with_capacity(num_values);
    let mut pos = 0;
    while out.len() < num_values {
        if pos >= data.len() {
            return Err(Error::TruncatedInput(
                "level block exhausted before expected value count".to_string(),
            ));
        }
        let (header, consumed) = uleb128::decode(&data[pos..])?;
        pos += consumed;

        if header & 1 == 0 {
            let run_len = (header >> 1) as usize;
            if pos >= data.len() {
                return Err(Error::TruncatedInput(
                    "RLE run missing its value byte".to_string(),
                ));
            }
            let value = data[pos] as u16;
            pos += 1;
            for _ in 0..run_len {
                out.push(value);
                if out.len() >= num_values {
                    break;
                }
            }
        } else {
            let num_groups = (header >> 1) as usize;
            let n = num_groups * 8;
            let bytes_needed = num_groups * width as usize;
            if pos + bytes_needed > data.len() {
                return Err(Error::TruncatedInput(
                    "bit-packed run header claims more bytes than the block holds".to_string(),
                ));
            }
            let unpacked = bitpacked::unpack(&data[pos..pos + bytes_needed], n, width)?;
            pos += bytes_needed;
            for value in unpacked {
                out.push(value as u16);
                if out.len() >= num_values {
                    break;
                }
            }
        }
    }
    out.truncate(num_values);
    Ok(out)
}

/// Writes a level block preceded by its 4-byte little-endian length, the unit a data page embeds
/// for its def-levels and rep-levels streams.
pub fn write_levels_block(values: &[u16], width: u8, out: &mut Vec<u8>) -> Result<()> {
    let body = encode_levels(values, width)?;
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&body);
    Ok(())
}

/// Reads a length-prefixed level block. Returns the decoded levels and the total number of bytes
/// consumed from `data` (length prefix included).
pub fn read_levels_block(data: &[u8], width: u8, num_values: usize) -> Result<(Vec<u16>, usize)> {
    if data.len() < 4 {
        return Err(Error::TruncatedInput(
            "level block missing its 4-byte length prefix".to_string(),
        ));
    }
    let len = super::get_length(data) as usize;
    if data.len() < 4 + len {
        return Err(Error::TruncatedInput(
            "level block shorter than its declared length".to_string(),
        ));
    }
    let values = decode_levels(&data[4..4 + len], width, num_values)?;
    Ok((values, 4 + len))
}

/// Ceil of `num_values / 8`, the number of bit-packed groups needed.
#[allow(dead_code)]
fn groups_needed(num_values: usize) -> usize {
    ceil8(num_values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_pure_rle() {
        let values = vec![2u16; 20];
        let encoded = encode_levels(&values, 2).unwrap();
        let decoded = decode_levels(&encoded, 2, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trip_pure_bitpacked() {
        let values: Vec<u16> = (0..16).map(|i| (i % 3) as u16).collect();
        let encoded = encode_levels(&values, 2).unwrap();
        let decoded = decode_levels(&encoded, 2, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn round_trip_mixed_runs() {
        let mut values = vec![1u16; 10]; // long equal run -> RLE
        values.extend([0, 1, 0, 1, 0, 1, 0, 1]); // alternating -> bit-packed
        values.extend(vec![0u16; 9]); // another long run
        let encoded = encode_levels(&values, 1).unwrap();
        let decoded = decode_levels(&encoded, 1, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn width_zero_is_all_zero_and_empty_bytes() {
        let values = vec![0u16; 5];
        let encoded = encode_levels(&values, 0).unwrap();
        assert!(encoded.is_empty());
        let decoded = decode_levels(&encoded, 0, values.len()).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn width_above_three_is_unsupported() {
        assert!(matches!(
            encode_levels(&[0, 1], 4),
            Err(Error::UnsupportedWidth(4))
        ));
    }

    #[test]
    fn length_prefixed_block_round_trips() {
        let values: Vec<u16> = vec![1, 0, 1, 1, 1, 1, 1, 1, 1, 1];
        let mut buf = Vec::new();
        write_levels_block(&values, 1, &mut buf).unwrap();
        let (decoded, consumed) = read_levels_block(&buf, 1, values.len()).unwrap();
        assert_eq!(decoded, values);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn round_trip_random_levels_at_every_supported_width() {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        for width in 0u8..=3 {
            let max: u32 = if width == 0 { 0 } else { (1u32 << width) - 1 };
            let values: Vec<u16> = (0..200).map(|_| rng.gen_range(0..=max) as u16).collect();
            let encoded = encode_levels(&values, width).unwrap();
            let decoded = decode_levels(&encoded, width, values.len()).unwrap();
            assert_eq!(decoded, values, "width {width} round trip failed");
        }
    }

    #[test]
    fn decode_multi_value_def_levels() {
        // def levels [1, 2, 2, 2], width 2.
        let values: Vec<u16> = vec![1, 2, 2, 2];
        let encoded = encode_levels(&values, 2).unwrap();
        let decoded = decode_levels(&encoded, 2, values.len()).unwrap();
        assert_eq!(decoded, values);
    }
}

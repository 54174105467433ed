//! Page compression: Snappy is the only codec this crate writes or reads, plus the no-op
//! `Uncompressed` case every page must still be able to round-trip through.

use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

use crate::error::Result;

/// The compression codec a column chunk declares in its metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Uncompressed,
    Snappy,
}

impl From<Compression> for parquet_format_safe::CompressionCodec {
    fn from(c: Compression) -> Self {
        match c {
            Compression::Uncompressed => parquet_format_safe::CompressionCodec::UNCOMPRESSED,
            Compression::Snappy => parquet_format_safe::CompressionCodec::SNAPPY,
        }
    }
}

impl TryFrom<parquet_format_safe::CompressionCodec> for Compression {
    type Error = crate::error::Error;

    fn try_from(c: parquet_format_safe::CompressionCodec) -> Result<Self> {
        match c {
            parquet_format_safe::CompressionCodec::UNCOMPRESSED => Ok(Compression::Uncompressed),
            parquet_format_safe::CompressionCodec::SNAPPY => Ok(Compression::Snappy),
            other => Err(crate::error::Error::CorruptPage(format!(
                "unsupported compression codec {other:?}"
            ))),
        }
    }
}

/// Compresses `input` into `output`, replacing whatever `output` held.
pub fn compress(codec: Compression, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    output.clear();
    match codec {
        Compression::Uncompressed => {
            output.extend_from_slice(input);
            Ok(())
        }
        Compression::Snappy => {
            let required_len = max_compress_len(input.len());
            output.resize(required_len, 0);
            let n = Encoder::new().compress(input, output)?;
            output.truncate(n);
            Ok(())
        }
    }
}

/// Decompresses `input` into `output`, which must already be sized to the uncompressed length
/// (as recorded in the page header's `uncompressed_page_size`).
pub fn decompress(codec: Compression, input: &[u8], output: &mut [u8]) -> Result<()> {
    match codec {
        Compression::Uncompressed => {
            if input.len() != output.len() {
                return Err(crate::error::Error::CorruptPage(format!(
                    "uncompressed page declared {} bytes but carries {}",
                    output.len(),
                    input.len()
                )));
            }
            output.copy_from_slice(input);
            Ok(())
        }
        Compression::Snappy => {
            let len = decompress_len(input)?;
            if len != output.len() {
                return Err(crate::error::Error::CorruptPage(format!(
                    "snappy-decompressed length {len} does not match the declared uncompressed size {}",
                    output.len()
                )));
            }
            Decoder::new().decompress(input, output)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snappy_round_trip() {
        let input = b"the quick brown fox jumps over the lazy dog, the quick brown fox jumps again";
        let mut compressed = Vec::new();
        compress(Compression::Snappy, input, &mut compressed).unwrap();
        assert!(compressed.len() < input.len());

        let mut decompressed = vec![0u8; input.len()];
        decompress(Compression::Snappy, &compressed, &mut decompressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn uncompressed_round_trip() {
        let input = b"raw bytes";
        let mut compressed = Vec::new();
        compress(Compression::Uncompressed, input, &mut compressed).unwrap();
        assert_eq!(compressed, input);

        let mut decompressed = vec![0u8; input.len()];
        decompress(Compression::Uncompressed, &compressed, &mut decompressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn decompress_rejects_size_mismatch() {
        let input = b"some bytes to compress for the mismatch check";
        let mut compressed = Vec::new();
        compress(Compression::Snappy, input, &mut compressed).unwrap();

        let mut wrong_size = vec![0u8; input.len() + 1];
        assert!(decompress(Compression::Snappy, &compressed, &mut wrong_size).is_err());
    }
}

//! One column chunk's page buffer and flush.

use std::io::Write;

use parquet_format_safe::{ColumnChunk, ColumnMetaData, Encoding as TEncoding};

use crate::compression::Compression;
use crate::encoding::Encoding;
use crate::error::Result;
use crate::page::write_data_page;
use crate::schema::ColumnSchema;
use crate::shred::Triple;

/// Buffers one column's triples for the row group currently being accumulated, and flushes
/// them as a single data page when the row group boundary is reached.
///
/// A fresh `ColumnChunkWriter` is created per row group: `meta_data.data_page_offset` and the
/// accumulated byte counts are scoped to the one page this writer ever flushes.
pub struct ColumnChunkWriter {
    column: ColumnSchema,
    compression: Compression,
    pending: Vec<Triple>,
    first_page_offset: Option<u64>,
    num_values: i64,
    total_uncompressed_size: i64,
    total_compressed_size: i64,
}

impl ColumnChunkWriter {
    pub fn new(column: ColumnSchema, compression: Compression) -> Self {
        ColumnChunkWriter {
            column,
            compression,
            pending: Vec::new(),
            first_page_offset: None,
            num_values: 0,
            total_uncompressed_size: 0,
            total_compressed_size: 0,
        }
    }

    pub fn push(&mut self, triple: Triple) {
        self.pending.push(triple);
    }

    /// Encodes and writes the buffered triples as one data page at `offset`. Returns the total
    /// number of bytes written (header included), so the caller can advance its running offset.
    pub fn flush<W: Write>(&mut self, writer: &mut W, offset: u64) -> Result<u64> {
        if self.first_page_offset.is_none() {
            self.first_page_offset = Some(offset);
        }
        let meta = write_data_page(writer, &self.column, &self.pending, self.compression)?;
        self.num_values += meta.num_values as i64;
        self.total_uncompressed_size += meta.uncompressed_size as i64;
        self.total_compressed_size += meta.compressed_size as i64;
        self.pending.clear();
        Ok(meta.compressed_size as u64)
    }

    /// Builds the Thrift `ColumnChunk` descriptor for the page(s) flushed so far.
    pub fn build_chunk(&self) -> ColumnChunk {
        let (physical_type, _) = crate::schema::physical_type_to_thrift(self.column.physical_type);
        let meta_data = ColumnMetaData {
            type_: physical_type,
            encodings: vec![TEncoding::from(Encoding::Plain), TEncoding::from(Encoding::Rle)],
            path_in_schema: self.column.path.clone(),
            codec: self.compression.into(),
            num_values: self.num_values,
            total_uncompressed_size: self.total_uncompressed_size,
            total_compressed_size: self.total_compressed_size,
            key_value_metadata: None,
            data_page_offset: self.first_page_offset.unwrap_or(0) as i64,
            index_page_offset: None,
            dictionary_page_offset: None,
            statistics: None,
            encoding_stats: None,
            bloom_filter_offset: None,
        };
        ColumnChunk {
            file_path: None,
            file_offset: self.first_page_offset.unwrap_or(0) as i64,
            meta_data: Some(meta_data),
            offset_index_offset: None,
            offset_index_length: None,
            column_index_offset: None,
            column_index_length: None,
            crypto_metadata: None,
            encrypted_column_metadata: None,
        }
    }
}

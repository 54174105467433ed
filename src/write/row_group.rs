//! Row-group accumulation: one [`ColumnChunkWriter`] per schema leaf, flushed together on a
//! row-group boundary.

use std::io::Write;

use parquet_format_safe::RowGroup;

use crate::compression::Compression;
use crate::error::Result;
use crate::schema::SchemaDescriptor;
use crate::shred::{shred_record, Triple};
use crate::value::Value;

use super::column::ColumnChunkWriter;

/// Buffers records for the row group currently being built.
pub struct RowGroupWriter {
    columns: Vec<ColumnChunkWriter>,
    num_rows: usize,
}

impl RowGroupWriter {
    pub fn new(schema: &SchemaDescriptor, compression: Compression) -> Self {
        RowGroupWriter {
            columns: schema
                .leaves()
                .iter()
                .map(|c| ColumnChunkWriter::new(c.clone(), compression))
                .collect(),
            num_rows: 0,
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Shreds `record` against `schema` and appends each leaf's triples to its column chunk.
    pub fn add(&mut self, record: &Value, schema: &SchemaDescriptor) -> Result<()> {
        let mut per_column: Vec<Vec<Triple>> = schema.leaves().iter().map(|_| Vec::new()).collect();
        shred_record(record, schema, &mut per_column)?;
        for (chunk, triples) in self.columns.iter_mut().zip(per_column) {
            for triple in triples {
                chunk.push(triple);
            }
        }
        self.num_rows += 1;
        Ok(())
    }

    /// Flushes every column chunk's page to `writer` starting at `*offset`, advancing it past
    /// the bytes written. Columns flush in schema order, so the reader — which assumes
    /// contiguous per-column storage — can scan forward without rewinding for metadata.
    pub fn flush<W: Write>(&mut self, writer: &mut W, offset: &mut u64) -> Result<RowGroup> {
        let mut columns = Vec::with_capacity(self.columns.len());
        for column in &mut self.columns {
            let written = column.flush(writer, *offset)?;
            *offset += written;
            columns.push(column.build_chunk());
        }
        let total_byte_size = columns
            .iter()
            .map(|c| c.meta_data.as_ref().unwrap().total_compressed_size)
            .sum();
        Ok(RowGroup {
            columns,
            total_byte_size,
            num_rows: self.num_rows as i64,
            sorting_columns: None,
            file_offset: None,
            total_compressed_size: None,
            ordinal: None,
        })
    }
}

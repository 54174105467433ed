//! Top-level file writer: header magic, row groups, Thrift footer, trailing magic.

use std::io::Write;

use parquet_format_safe::{FileMetaData, RowGroup};

use crate::compression::Compression;
use crate::error::Result;
use crate::schema::SchemaDescriptor;
use crate::thrift_io::write_thrift;
use crate::value::Value;
use crate::{DEFAULT_PAGE_SIZE, PARQUET_MAGIC};

use super::row_group::RowGroupWriter;

/// Page-size and compression knobs for a [`FileWriter`]. The default (1000 records per row
/// group, Snappy) lives here as [`WriteOptions::default`].
#[derive(Clone, Copy, Debug)]
pub struct WriteOptions {
    pub page_size: usize,
    pub compression: Compression,
}

impl Default for WriteOptions {
    fn default() -> Self {
        WriteOptions {
            page_size: DEFAULT_PAGE_SIZE,
            compression: Compression::Snappy,
        }
    }
}

/// Writes records to a Parquet-shaped file.
///
/// The row group currently accumulating records flushes automatically once it reaches
/// `options.page_size` records, or explicitly via [`FileWriter::flush_row_group`]. The sink
/// passed to [`FileWriter::new`] is not owned by this writer and is never closed by it; a
/// partially written file (dropped before [`FileWriter::close`]) is not a valid Parquet file
/// and is the caller's responsibility.
pub struct FileWriter<W: Write> {
    writer: W,
    schema: SchemaDescriptor,
    options: WriteOptions,
    offset: u64,
    started: bool,
    row_groups: Vec<RowGroup>,
    current: RowGroupWriter,
    num_rows: i64,
}

impl<W: Write> FileWriter<W> {
    pub fn new(writer: W, schema: SchemaDescriptor, options: WriteOptions) -> Self {
        let current = RowGroupWriter::new(&schema, options.compression);
        FileWriter {
            writer,
            schema,
            options,
            offset: 0,
            started: false,
            row_groups: Vec::new(),
            current,
            num_rows: 0,
        }
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Total number of records added so far, across all row groups.
    pub fn num_rows(&self) -> i64 {
        self.num_rows
    }

    fn ensure_started(&mut self) -> Result<()> {
        if !self.started {
            self.writer.write_all(&PARQUET_MAGIC)?;
            self.offset = PARQUET_MAGIC.len() as u64;
            self.started = true;
        }
        Ok(())
    }

    /// Shreds and buffers one record, flushing the current row group automatically once it
    /// reaches `options.page_size` records.
    pub fn add(&mut self, record: &Value) -> Result<()> {
        self.ensure_started()?;
        self.current.add(record, &self.schema)?;
        self.num_rows += 1;
        if self.current.num_rows() >= self.options.page_size {
            self.flush_row_group()?;
        }
        Ok(())
    }

    /// Flushes the in-progress row group, starting a fresh one. A no-op if no records are
    /// pending.
    pub fn flush_row_group(&mut self) -> Result<()> {
        if self.current.num_rows() == 0 {
            return Ok(());
        }
        let mut finished = std::mem::replace(
            &mut self.current,
            RowGroupWriter::new(&self.schema, self.options.compression),
        );
        let group = finished.flush(&mut self.writer, &mut self.offset)?;
        self.row_groups.push(group);
        Ok(())
    }

    /// Flushes any pending row group, writes the Thrift `FileMetaData` footer, its 4-byte
    /// little-endian length, and the trailing `PAR1` magic. Returns the underlying sink.
    pub fn close(mut self) -> Result<W> {
        self.ensure_started()?;
        self.flush_row_group()?;

        let metadata = FileMetaData {
            version: 1,
            schema: self.schema.to_thrift(),
            num_rows: self.num_rows,
            row_groups: self.row_groups,
            key_value_metadata: None,
            created_by: None,
            column_orders: None,
            encryption_algorithm: None,
            footer_signing_key_metadata: None,
        };

        let mut footer_bytes = Vec::new();
        write_thrift(&metadata, &mut footer_bytes)?;
        self.writer.write_all(&footer_bytes)?;
        self.writer
            .write_all(&(footer_bytes.len() as u32).to_le_bytes())?;
        self.writer.write_all(&PARQUET_MAGIC)?;
        Ok(self.writer)
    }
}

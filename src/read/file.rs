//! Row-group and record streaming: [`FileReader`] streams one row group at a time;
//! [`RecordReader`] flattens that into one record at a time with a sticky error accessor.

use std::io::{Read, Seek, SeekFrom};

use crate::assemble::assemble_records;
use crate::error::{Error, Result};
use crate::page::read_data_page;
use crate::schema::{ColumnSchema, SchemaDescriptor};
use crate::shred::Triple;
use crate::value::Value;

use super::metadata::{read_metadata, ColumnChunkMeta, FileMetadata, RowGroupMeta};

/// Opens a Parquet-shaped file for reading: the trailer and footer are parsed once on
/// construction and kept in memory; row groups are streamed one at a time and page buffers are
/// released after each page is drained.
pub struct FileReader<R: Read + Seek> {
    reader: R,
    metadata: FileMetadata,
    next_row_group: usize,
}

impl<R: Read + Seek> FileReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let metadata = read_metadata(&mut reader)?;
        Ok(FileReader {
            reader,
            metadata,
            next_row_group: 0,
        })
    }

    pub fn schema(&self) -> &SchemaDescriptor {
        &self.metadata.schema
    }

    /// Total number of records across the whole file, as declared by the footer.
    pub fn num_rows(&self) -> u64 {
        self.metadata.num_rows
    }

    pub fn num_row_groups(&self) -> usize {
        self.metadata.row_groups.len()
    }

    /// Reads and reassembles every record of the next row group, advancing past it. Returns
    /// `None` once every row group has been consumed.
    pub fn next_row_group(&mut self) -> Option<Result<Vec<Value>>> {
        if self.next_row_group >= self.metadata.row_groups.len() {
            return None;
        }
        let group = self.metadata.row_groups[self.next_row_group].clone();
        self.next_row_group += 1;
        Some(self.read_row_group(&group))
    }

    fn read_row_group(&mut self, group: &RowGroupMeta) -> Result<Vec<Value>> {
        if group.columns.len() != self.metadata.schema.leaves().len() {
            return Err(Error::SchemaViolation(format!(
                "row group declares {} column chunks, schema has {} leaves",
                group.columns.len(),
                self.metadata.schema.leaves().len()
            )));
        }
        let leaves = self.metadata.schema.leaves().to_vec();
        let mut columns: Vec<Vec<Triple>> = Vec::with_capacity(leaves.len());
        for (column, chunk) in leaves.iter().zip(group.columns.iter()) {
            columns.push(self.read_column_chunk(column, chunk)?);
        }
        assemble_records(&self.metadata.schema, &columns)
    }

    fn read_column_chunk(
        &mut self,
        column: &ColumnSchema,
        chunk: &ColumnChunkMeta,
    ) -> Result<Vec<Triple>> {
        self.reader.seek(SeekFrom::Start(chunk.data_page_offset))?;
        let mut triples = Vec::new();
        while (triples.len() as u64) < chunk.num_values {
            let page = read_data_page(&mut self.reader, column, chunk.compression)?;
            if page.is_empty() {
                return Err(Error::CorruptPage(
                    "data page decoded zero values while the column chunk still expects more"
                        .to_string(),
                ));
            }
            triples.extend(page);
        }
        if triples.len() as u64 != chunk.num_values {
            return Err(Error::CorruptPage(format!(
                "column chunk declared {} values but its pages decoded {}",
                chunk.num_values,
                triples.len()
            )));
        }
        Ok(triples)
    }
}

/// Flattens every row group of a [`FileReader`] into one record at a time.
///
/// Once any row group fails to read, [`RecordReader::next`] returns `None` for every subsequent
/// call and the failure stays observable through [`RecordReader::error`], so a caller driving
/// this in a loop does not need to inspect the result of every single call.
pub struct RecordReader<R: Read + Seek> {
    file: FileReader<R>,
    buffered: std::vec::IntoIter<Value>,
    error: Option<Error>,
}

impl<R: Read + Seek> RecordReader<R> {
    pub fn new(file: FileReader<R>) -> Self {
        RecordReader {
            file,
            buffered: Vec::new().into_iter(),
            error: None,
        }
    }

    /// The first error this reader encountered, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Reads the next record, or `None` once the file is exhausted or a prior call failed.
    pub fn next(&mut self) -> Option<Value> {
        if self.error.is_some() {
            return None;
        }
        loop {
            if let Some(record) = self.buffered.next() {
                return Some(record);
            }
            match self.file.next_row_group()? {
                Ok(records) => self.buffered = records.into_iter(),
                Err(e) => {
                    self.error = Some(e);
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSchema;
    use crate::value::{PhysicalType, Repetition};
    use crate::write::{FileWriter, WriteOptions};
    use std::io::Cursor;

    fn flat_int32_schema() -> SchemaDescriptor {
        SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["id".to_string()],
            PhysicalType::Int32,
            vec![Repetition::Required],
        )])
    }

    #[test]
    fn required_int32_column_round_trips() {
        let schema = flat_int32_schema();
        let records = vec![
            Value::Group(vec![("id".to_string(), Value::Int32(1))]),
            Value::Group(vec![("id".to_string(), Value::Int32(2))]),
            Value::Group(vec![("id".to_string(), Value::Int32(3))]),
        ];

        let mut writer = FileWriter::new(Vec::new(), schema, WriteOptions::default());
        for record in &records {
            writer.add(record).unwrap();
        }
        let bytes = writer.close().unwrap();

        let mut reader = FileReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.num_rows(), 3);
        assert_eq!(reader.num_row_groups(), 1);
        let group = reader.next_row_group().unwrap().unwrap();
        assert_eq!(group, records);
        assert!(reader.next_row_group().is_none());
    }

    #[test]
    fn optional_int32_column_preserves_absence() {
        let schema = SchemaDescriptor::new(vec![ColumnSchema::new(
            vec!["id".to_string()],
            PhysicalType::Int32,
            vec![Repetition::Optional],
        )]);
        let records = vec![
            Value::Group(vec![("id".to_string(), Value::Int32(10))]),
            Value::Group(vec![]),
            Value::Group(vec![("id".to_string(), Value::Int32(20))]),
        ];

        let mut writer = FileWriter::new(Vec::new(), schema, WriteOptions::default());
        for record in &records {
            writer.add(record).unwrap();
        }
        let bytes = writer.close().unwrap();

        let mut reader = FileReader::new(Cursor::new(bytes)).unwrap();
        let group = reader.next_row_group().unwrap().unwrap();
        assert_eq!(group, records);
        assert_eq!(group[1].field("id"), None);
    }

    #[test]
    fn five_records_at_page_size_two_split_into_three_row_groups() {
        let schema = flat_int32_schema();
        let options = WriteOptions {
            page_size: 2,
            ..WriteOptions::default()
        };
        let mut writer = FileWriter::new(Vec::new(), schema, options);
        for id in 1..=5 {
            writer
                .add(&Value::Group(vec![("id".to_string(), Value::Int32(id))]))
                .unwrap();
        }
        let bytes = writer.close().unwrap();

        let mut reader = FileReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.num_rows(), 5);
        assert_eq!(reader.num_row_groups(), 3);

        let sizes: Vec<usize> = std::iter::from_fn(|| reader.next_row_group())
            .map(|r| r.unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn record_reader_flattens_row_groups_and_sticks_on_error() {
        let schema = flat_int32_schema();
        let options = WriteOptions {
            page_size: 2,
            ..WriteOptions::default()
        };
        let mut writer = FileWriter::new(Vec::new(), schema, options);
        for id in 1..=5 {
            writer
                .add(&Value::Group(vec![("id".to_string(), Value::Int32(id))]))
                .unwrap();
        }
        let bytes = writer.close().unwrap();

        let reader = FileReader::new(Cursor::new(bytes)).unwrap();
        let mut records = RecordReader::new(reader);
        let mut seen = Vec::new();
        while let Some(record) = records.next() {
            seen.push(record);
        }
        assert_eq!(seen.len(), 5);
        assert!(records.error().is_none());
        assert!(records.next().is_none());
    }
}

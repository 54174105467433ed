//! Trailer and footer parsing: validates the leading and trailing `PAR1` magic, then
//! Thrift-decodes the `FileMetaData` found by walking backwards from the footer length prefix.

use std::io::{Read, Seek, SeekFrom};

use parquet_format_safe::FileMetaData as TFileMetaData;

use crate::compression::Compression;
use crate::error::{Error, Result};
use crate::schema::SchemaDescriptor;
use crate::thrift_io::read_thrift;
use crate::{DEFAULT_FOOTER_READ_SIZE, FOOTER_SIZE, PARQUET_MAGIC};

/// One column chunk's position and declared size within a row group, as recorded in the footer.
#[derive(Clone, Debug)]
pub struct ColumnChunkMeta {
    pub path: Vec<String>,
    pub data_page_offset: u64,
    pub num_values: u64,
    pub compression: Compression,
}

/// One row group's column chunks, in schema order.
#[derive(Clone, Debug)]
pub struct RowGroupMeta {
    pub num_rows: u64,
    pub columns: Vec<ColumnChunkMeta>,
}

/// The parsed file footer: schema plus every row group's column-chunk positions.
#[derive(Clone, Debug)]
pub struct FileMetadata {
    pub schema: SchemaDescriptor,
    pub num_rows: u64,
    pub row_groups: Vec<RowGroupMeta>,
}

/// Reads the trailer and Thrift footer of a Parquet-shaped file.
///
/// Validates the leading `PAR1` magic at offset 0, then reads up to
/// [`DEFAULT_FOOTER_READ_SIZE`] bytes from the end in one shot — large enough to cover the
/// trailer and footer of most files without a second round trip — validates the trailing magic
/// and length prefix found there, and falls back to a second, precisely sized read only if the
/// footer turns out to be larger than that window.
pub fn read_metadata<R: Read + Seek>(reader: &mut R) -> Result<FileMetadata> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    if file_size < PARQUET_MAGIC.len() as u64 + FOOTER_SIZE {
        return Err(Error::TruncatedInput(
            "file is smaller than the leading magic plus the trailer".to_string(),
        ));
    }

    reader.seek(SeekFrom::Start(0))?;
    let mut leading = [0u8; 4];
    reader.read_exact(&mut leading)?;
    if leading != PARQUET_MAGIC {
        return Err(Error::InvalidMagic);
    }

    let tail_len = std::cmp::min(DEFAULT_FOOTER_READ_SIZE, file_size) as usize;
    reader.seek(SeekFrom::End(-(tail_len as i64)))?;
    let mut tail = vec![0u8; tail_len];
    reader.read_exact(&mut tail)?;

    if tail[tail_len - 4..] != PARQUET_MAGIC[..] {
        return Err(Error::InvalidMagic);
    }
    let footer_len =
        u32::from_le_bytes(tail[tail_len - 8..tail_len - 4].try_into().unwrap()) as u64;
    let footer_metadata_len = FOOTER_SIZE + footer_len;
    if footer_metadata_len > file_size {
        return Err(Error::CorruptPage(
            "footer length is larger than the file itself".to_string(),
        ));
    }
    if file_size - footer_metadata_len < PARQUET_MAGIC.len() as u64 {
        return Err(Error::CorruptPage(
            "footer length overruns the leading magic".to_string(),
        ));
    }

    let footer: TFileMetaData = if footer_metadata_len as usize <= tail_len {
        let start = tail_len - footer_metadata_len as usize;
        let end = tail_len - FOOTER_SIZE as usize;
        read_thrift(&mut &tail[start..end])?
    } else {
        reader.seek(SeekFrom::Start(file_size - footer_metadata_len))?;
        let mut footer_bytes = vec![0u8; footer_len as usize];
        reader.read_exact(&mut footer_bytes)?;
        read_thrift(&mut &footer_bytes[..])?
    };

    let schema = SchemaDescriptor::try_from_thrift(&footer.schema)?;

    let row_groups = footer
        .row_groups
        .into_iter()
        .map(|rg| {
            let columns = rg
                .columns
                .into_iter()
                .map(|chunk| {
                    let meta = chunk.meta_data.ok_or_else(|| {
                        Error::SchemaViolation("column chunk has no meta_data".to_string())
                    })?;
                    Ok(ColumnChunkMeta {
                        path: meta.path_in_schema,
                        data_page_offset: meta.data_page_offset as u64,
                        num_values: meta.num_values as u64,
                        compression: Compression::try_from(meta.codec)?,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(RowGroupMeta {
                num_rows: rg.num_rows as u64,
                columns,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FileMetadata {
        num_rows: footer.num_rows as u64,
        schema,
        row_groups,
    })
}

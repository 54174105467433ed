//! Data page framing: level blocks, the PLAIN primitive codec, Snappy compression and the Thrift
//! `PageHeader`, assembled into one page per flush and parsed back one page at a time.

use std::io::{Read, Write};

use parquet_format_safe::{DataPageHeader, PageHeader, PageType};

use crate::compression::{self, Compression};
use crate::encoding::{hybrid_rle, Encoding};
use crate::error::{Error, Result};
use crate::schema::ColumnSchema;
use crate::shred::Triple;
use crate::thrift_io::{read_thrift, write_thrift};
use crate::value::{PhysicalType, Value};

/// Byte accounting a written page contributes to its column chunk's metadata.
#[derive(Clone, Copy, Debug)]
pub struct PageMeta {
    pub num_values: usize,
    pub uncompressed_size: usize,
    pub compressed_size: usize,
}

/// Encodes `triples` as one data page and writes it (header then compressed body) to `writer`.
pub fn write_data_page<W: Write>(
    writer: &mut W,
    column: &ColumnSchema,
    triples: &[Triple],
    compression: Compression,
) -> Result<PageMeta> {
    let rep_width = ColumnSchema::bit_width(column.max_rep());
    let def_width = ColumnSchema::bit_width(column.max_def());

    let mut body = Vec::new();
    if column.max_rep() > 0 {
        let reps: Vec<u16> = triples.iter().map(|(_, _, r)| *r).collect();
        hybrid_rle::write_levels_block(&reps, rep_width, &mut body)?;
    }
    if column.max_def() > 0 {
        let defs: Vec<u16> = triples.iter().map(|(_, d, _)| *d).collect();
        hybrid_rle::write_levels_block(&defs, def_width, &mut body)?;
    }
    let values: Vec<&Value> = triples
        .iter()
        .filter_map(|(v, _, _)| v.as_ref())
        .collect();
    encode_plain_values(&values, column.physical_type, &mut body)?;

    let uncompressed_size = body.len();
    let mut compressed = Vec::new();
    compression::compress(compression, &body, &mut compressed)?;
    let compressed_size = compressed.len();

    let header = PageHeader {
        type_: PageType::DATA_PAGE,
        uncompressed_page_size: uncompressed_size as i32,
        compressed_page_size: compressed_size as i32,
        crc: None,
        data_page_header: Some(DataPageHeader {
            num_values: triples.len() as i32,
            encoding: Encoding::Plain.into(),
            definition_level_encoding: Encoding::Rle.into(),
            repetition_level_encoding: Encoding::Rle.into(),
            statistics: None,
        }),
        index_page_header: None,
        dictionary_page_header: None,
        data_page_header_v2: None,
    };
    let mut header_bytes = Vec::new();
    write_thrift(&header, &mut header_bytes)?;
    writer.write_all(&header_bytes)?;
    writer.write_all(&compressed)?;

    Ok(PageMeta {
        num_values: triples.len(),
        uncompressed_size: header_bytes.len() + uncompressed_size,
        compressed_size: header_bytes.len() + compressed_size,
    })
}

/// Reads and decodes the next data page from `reader`, using the column chunk's declared
/// compression codec.
pub fn read_data_page<R: Read>(
    reader: &mut R,
    column: &ColumnSchema,
    codec: Compression,
) -> Result<Vec<Triple>> {
    let header: PageHeader = read_thrift(reader)?;
    if header.type_ != PageType::DATA_PAGE {
        return Err(Error::CorruptPage(format!(
            "expected a DATA_PAGE header, found {:?}",
            header.type_
        )));
    }
    let data_header = header
        .data_page_header
        .ok_or_else(|| Error::CorruptPage("DATA_PAGE header missing data_page_header".to_string()))?;
    let num_values = data_header.num_values as usize;

    let mut compressed = vec![0u8; header.compressed_page_size as usize];
    reader.read_exact(&mut compressed)?;
    let mut body = vec![0u8; header.uncompressed_page_size as usize];
    compression::decompress(codec, &compressed, &mut body)?;

    decode_page_body(&body, column, num_values)
}

fn decode_page_body(body: &[u8], column: &ColumnSchema, num_values: usize) -> Result<Vec<Triple>> {
    let rep_width = ColumnSchema::bit_width(column.max_rep());
    let def_width = ColumnSchema::bit_width(column.max_def());

    let mut pos = 0;
    let reps = if column.max_rep() > 0 {
        let (values, consumed) = hybrid_rle::read_levels_block(&body[pos..], rep_width, num_values)?;
        pos += consumed;
        values
    } else {
        vec![0u16; num_values]
    };
    let defs = if column.max_def() > 0 {
        let (values, consumed) = hybrid_rle::read_levels_block(&body[pos..], def_width, num_values)?;
        pos += consumed;
        values
    } else {
        vec![0u16; num_values]
    };

    let num_present = defs.iter().filter(|&&d| d == column.max_def()).count();
    let values = decode_plain_values(&body[pos..], column.physical_type, num_present)?;

    if defs.len() != num_values || reps.len() != num_values {
        return Err(Error::CorruptPage(format!(
            "page declared {num_values} values but decoded {} def levels / {} rep levels",
            defs.len(),
            reps.len()
        )));
    }

    let mut values = values.into_iter();
    let mut out = Vec::with_capacity(num_values);
    for i in 0..num_values {
        let value = if defs[i] == column.max_def() {
            Some(values.next().ok_or_else(|| {
                Error::CorruptPage("value stream exhausted before definition levels".to_string())
            })?)
        } else {
            None
        };
        out.push((value, defs[i], reps[i]));
    }
    Ok(out)
}

/// PLAIN-encodes a column's present leaf values.
pub fn encode_plain_values(values: &[&Value], physical_type: PhysicalType, out: &mut Vec<u8>) -> Result<()> {
    if physical_type == PhysicalType::Bool {
        let bits: Vec<u32> = values
            .iter()
            .map(|v| match v {
                Value::Bool(b) => Ok(*b as u32),
                other => Err(mismatched_type(other, physical_type)),
            })
            .collect::<Result<Vec<_>>>()?;
        let mut padded = bits;
        let pad = (8 - padded.len() % 8) % 8;
        padded.resize(padded.len() + pad, 0);
        if !padded.is_empty() {
            crate::encoding::bitpacked::pack(&padded, 1, out)?;
        }
        return Ok(());
    }

    for value in values {
        match (value, physical_type) {
            (Value::Int32(x), PhysicalType::Int32) => out.extend_from_slice(&x.to_le_bytes()),
            (Value::UInt32(x), PhysicalType::UInt32) => out.extend_from_slice(&x.to_le_bytes()),
            (Value::Int64(x), PhysicalType::Int64) => out.extend_from_slice(&x.to_le_bytes()),
            (Value::UInt64(x), PhysicalType::UInt64) => out.extend_from_slice(&x.to_le_bytes()),
            (Value::Float32(x), PhysicalType::Float32) => out.extend_from_slice(&x.to_le_bytes()),
            (Value::Float64(x), PhysicalType::Float64) => out.extend_from_slice(&x.to_le_bytes()),
            (Value::ByteArray(bytes), PhysicalType::ByteArray) => {
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(bytes);
            }
            (other, expected) => return Err(mismatched_type(other, expected)),
        }
    }
    Ok(())
}

fn mismatched_type(value: &Value, expected: PhysicalType) -> Error {
    Error::SchemaViolation(format!(
        "value {value:?} does not match column physical type {expected:?}"
    ))
}

/// Decodes `count` PLAIN-encoded values of `physical_type` from `data`.
pub fn decode_plain_values(data: &[u8], physical_type: PhysicalType, count: usize) -> Result<Vec<Value>> {
    if physical_type == PhysicalType::Bool {
        let unpacked = crate::encoding::bitpacked::unpack(data, count, 1)?;
        return Ok(unpacked.into_iter().map(|b| Value::Bool(b != 0)).collect());
    }

    let mut out = Vec::with_capacity(count);
    let mut pos = 0;
    for _ in 0..count {
        match physical_type {
            PhysicalType::Int32 | PhysicalType::UInt32 | PhysicalType::Float32 => {
                let bytes = take(data, &mut pos, 4)?;
                out.push(match physical_type {
                    PhysicalType::Int32 => Value::Int32(i32::from_le_bytes(bytes.try_into().unwrap())),
                    PhysicalType::UInt32 => Value::UInt32(u32::from_le_bytes(bytes.try_into().unwrap())),
                    PhysicalType::Float32 => Value::Float32(f32::from_le_bytes(bytes.try_into().unwrap())),
                    _ => unreachable!(),
                });
            }
            PhysicalType::Int64 | PhysicalType::UInt64 | PhysicalType::Float64 => {
                let bytes = take(data, &mut pos, 8)?;
                out.push(match physical_type {
                    PhysicalType::Int64 => Value::Int64(i64::from_le_bytes(bytes.try_into().unwrap())),
                    PhysicalType::UInt64 => Value::UInt64(u64::from_le_bytes(bytes.try_into().unwrap())),
                    PhysicalType::Float64 => Value::Float64(f64::from_le_bytes(bytes.try_into().unwrap())),
                    _ => unreachable!(),
                });
            }
            PhysicalType::ByteArray => {
                let len_bytes = take(data, &mut pos, 4)?;
                let len = u32::from_le_bytes(len_bytes.try_into().unwrap()) as usize;
                let bytes = take(data, &mut pos, len)?;
                out.push(Value::ByteArray(bytes.to_vec()));
            }
            PhysicalType::Bool => unreachable!("handled above"),
        }
    }
    Ok(out)
}

fn take<'a>(data: &'a [u8], pos: &mut usize, len: usize) -> Result<&'a [u8]> {
    if *pos + len > data.len() {
        return Err(Error::TruncatedInput(format!(
            "value stream needs {len} more bytes at offset {pos}, only {} available",
            data.len() - *pos
        )));
    }
    let slice = &data[*pos..*pos + len];
    *pos += len;
    Ok(slice)
}

//! Thin bridge to Thrift compact protocol I/O for the handful of structs this crate serialises
//! (`PageHeader`, `FileMetaData`) — every other concern stays in ordinary Rust types.

use std::io::{Read, Write};

use parquet_format_safe::thrift::protocol::{
    TCompactInputProtocol, TCompactOutputProtocol, TSerializable,
};

use crate::error::Result;

pub fn write_thrift<T: TSerializable, W: Write>(value: &T, writer: &mut W) -> Result<()> {
    let mut protocol = TCompactOutputProtocol::new(writer);
    value.write_to_out_protocol(&mut protocol)?;
    Ok(())
}

pub fn read_thrift<T: TSerializable, R: Read>(reader: &mut R) -> Result<T> {
    let mut protocol = TCompactInputProtocol::new(reader);
    Ok(T::read_from_in_protocol(&mut protocol)?)
}

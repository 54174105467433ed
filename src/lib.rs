#![forbid(unsafe_code)]
//! Columnar shredding/assembly core for a Parquet-shaped file format.
//!
//! Records are represented by [`value::Value`], a self-describing nested tree, so that the
//! Dremel-style shredder ([`shred`]) and assembler ([`assemble`]) need no per-record-type code
//! generation. [`write::FileWriter`] and [`read::FileReader`] frame the shredded columns into
//! pages, row groups, and a Thrift-encoded footer bracketed by the `PAR1` magic.

pub mod error;
pub mod compression;
pub mod encoding;
pub mod schema;
pub mod value;

pub mod assemble;
pub mod page;
pub mod shred;

pub mod read;
pub mod write;

pub use value::Value;

/// Leading and trailing magic bytes of every file this crate writes or reads.
pub const PARQUET_MAGIC: [u8; 4] = [b'P', b'A', b'R', b'1'];

/// Size, in bytes, of the trailer: a 4-byte little-endian footer length followed by
/// [`PARQUET_MAGIC`].
pub const FOOTER_SIZE: u64 = 8;

/// Default number of records buffered per row group before an automatic flush.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Number of bytes read from the end of the file on first open, before falling back to a second,
/// precisely-sized read when the footer turns out to be larger.
pub const DEFAULT_FOOTER_READ_SIZE: u64 = 64 * 1024;

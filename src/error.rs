//! The error type returned by every fallible operation in this crate.

/// Errors surfaced by the shredder, assembler, level/primitive codecs, and the page/row-group
/// and footer I/O layers.
#[derive(Debug)]
pub enum Error {
    /// A required leaf was absent, a path was not found in the schema, or the file footer
    /// references a column not present in the schema.
    SchemaViolation(String),
    /// The level codec was asked to encode or decode a bit width greater than 3.
    UnsupportedWidth(u8),
    /// The input ended before a level block, page header, or value stream was fully consumed.
    TruncatedInput(String),
    /// A page's compressed bytes did not decompress, its header type was not `DATA_PAGE`, its
    /// declared value count did not match what was decoded, or the footer length prefix is
    /// inconsistent with the file size.
    CorruptPage(String),
    /// The leading or trailing 4 bytes of the file were not `PAR1`.
    InvalidMagic,
    /// The underlying sink or source returned an I/O error.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::SchemaViolation(msg) => write!(f, "schema violation: {msg}"),
            Error::UnsupportedWidth(w) => {
                write!(f, "unsupported level width {w} (max supported is 3)")
            }
            Error::TruncatedInput(msg) => write!(f, "truncated input: {msg}"),
            Error::CorruptPage(msg) => write!(f, "corrupt page: {msg}"),
            Error::InvalidMagic => write!(f, "invalid PAR1 magic"),
            Error::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<snap::Error> for Error {
    fn from(e: snap::Error) -> Self {
        Error::CorruptPage(format!("snappy: {e}"))
    }
}

impl From<parquet_format_safe::thrift::Error> for Error {
    fn from(e: parquet_format_safe::thrift::Error) -> Self {
        Error::CorruptPage(format!("thrift: {e}"))
    }
}

/// A specialized `Result` for this crate's errors.
pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid binlog format: {0}")]
    InvalidBinlogFormat(String),
    #[error("binlog event error: {0}")]
    BinlogEventError(String),
    #[error("binlog checksum mismatch: expected={0}, actual={1}")]
    BinlogChecksumMismatch(u32, u32),
    #[error("truncated payload header: {0}")]
    TruncatedHeader(String),
    #[error("truncated payload: expected={expected}, actual={actual}")]
    TruncatedPayload { expected: u32, actual: usize },
    #[error("payload too large: {0}")]
    PayloadTooLarge(u32),
    #[error("unsupported compression type: {0}")]
    UnsupportedCompression(u32),
    #[error("corrupt compressed data: {0}")]
    CorruptCompressedData(String),
    #[error("sub event {0} decode error: {1}")]
    SubEventDecodeError(usize, #[source] Box<Error>),
    #[error("utf8 string error: {0}")]
    Utf8StringError(#[from] std::string::FromUtf8Error),
    #[error("parse error: {0}")]
    ParseError(#[from] bytes_parser::error::Error),
    #[error("io: {0}")]
    IO(#[from] std::io::Error),
}

use bytes::Bytes;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// the first field keeps the unread input at the point of failure
    #[error("incomplete input: needed={1:?}")]
    InputIncomplete(Bytes, Needed),
    #[error("constraint error: {0}")]
    ConstraintError(String),
    #[error("utf8 error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Needed {
    Unknown,
    Size(usize),
}

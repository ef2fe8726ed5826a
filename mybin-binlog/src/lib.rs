//! MySQL binlog events, stream deserializer and transaction payload decoding
pub mod binlog;
pub mod error;
pub mod opts;
mod util;

pub use crate::binlog::*;
pub use crate::error::{Error, Result};
pub use crate::opts::DeserializerOpts;

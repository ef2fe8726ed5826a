//! essential parsing of bytes
//!
//! all readers operate on `bytes::Bytes` as a cursor: every successful
//! read consumes the bytes it returns, and slices are zero-copy.
//! inspired by nom parser combinator (https://github.com/Geal/nom)
pub mod bytes;
pub mod error;
pub mod my;

pub use crate::bytes::{ReadBytesExt, WriteBytesExt};
pub use error::*;

use ::bytes::{Bytes, BytesMut};

pub trait ReadFromBytes: Sized {
    /// read object from the head of input, advancing it
    fn read_from(input: &mut Bytes) -> Result<Self>;
}

pub trait ReadFromBytesWithContext<'c>: Sized {
    type Context: 'c;

    /// generic method to read object from input with given context
    fn read_with_ctx(input: &mut Bytes, ctx: Self::Context) -> Result<Self>;
}

pub trait WriteToBytes {
    /// write self to the tail of output, returns number of bytes written
    fn write_to(self, out: &mut BytesMut) -> Result<usize>;
}

pub trait WriteToBytesWithContext<'c> {
    type Context: 'c;

    fn write_with_ctx(self, out: &mut BytesMut, ctx: Self::Context) -> Result<usize>;
}

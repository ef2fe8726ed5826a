use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::Result;
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// Data of RowsQueryLogEvent
///
/// the leading length byte is truncated for queries longer than 255,
/// so the query always extends to the end of event.
#[derive(Debug, Clone, PartialEq)]
pub struct RowsQueryData {
    pub query: Bytes,
}

impl ReadFromBytes for RowsQueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        input.read_u8()?;
        let query = input.split_to(input.remaining());
        Ok(RowsQueryData { query })
    }
}

impl WriteToBytes for RowsQueryData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_u8(self.query.len().min(0xff) as u8)?;
        len += out.write_bytes(self.query)?;
        Ok(len)
    }
}

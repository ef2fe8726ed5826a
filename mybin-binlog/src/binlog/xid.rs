use bytes::{Bytes, BytesMut};
use bytes_parser::error::Result;
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// Data of XidEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/xid-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct XidData {
    pub xid: u64,
}

impl ReadFromBytes for XidData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let xid = input.read_le_u64()?;
        Ok(XidData { xid })
    }
}

impl WriteToBytes for XidData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        out.write_le_u64(self.xid)
    }
}

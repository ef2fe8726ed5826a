use bytes::{Bytes, BytesMut};
use bytes_parser::error::Result;
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// Data of RandEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/rand-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct RandData {
    pub seed1: u64,
    pub seed2: u64,
}

impl ReadFromBytes for RandData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let seed1 = input.read_le_u64()?;
        let seed2 = input.read_le_u64()?;
        Ok(RandData { seed1, seed2 })
    }
}

impl WriteToBytes for RandData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_le_u64(self.seed1)?;
        len += out.write_le_u64(self.seed2)?;
        Ok(len)
    }
}

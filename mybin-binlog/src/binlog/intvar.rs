use bitflags::bitflags;
use bytes::{Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// Data of IntvarEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/intvar-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct IntvarData {
    pub key: IntvarKey,
    pub value: u64,
}

impl ReadFromBytes for IntvarData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let key = input.read_u8()?;
        let key = IntvarKey::from_bits(key)
            .ok_or_else(|| Error::ConstraintError(format!("invalid intvar key {}", key)))?;
        let value = input.read_le_u64()?;
        Ok(IntvarData { key, value })
    }
}

impl WriteToBytes for IntvarData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_u8(self.key.bits())?;
        len += out.write_le_u64(self.value)?;
        Ok(len)
    }
}

bitflags! {
    pub struct IntvarKey: u8 {
        const LAST_INSERT_ID = 0x01;
        const INSERT_ID = 0x02;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intvar_data() -> Result<()> {
        let mut input = Bytes::from_static(&[0x02, 0x0a, 0, 0, 0, 0, 0, 0, 0]);
        let data = IntvarData::read_from(&mut input)?;
        assert_eq!(IntvarKey::INSERT_ID, data.key);
        assert_eq!(10, data.value);

        let mut input = Bytes::from_static(&[0x04, 0x0a, 0, 0, 0, 0, 0, 0, 0]);
        assert!(IntvarData::read_from(&mut input).is_err());
        Ok(())
    }
}

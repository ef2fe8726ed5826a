use bitflags::bitflags;
use bytes::{Buf, Bytes};
use bytes_parser::error::{Error, Result};
use bytes_parser::{ReadBytesExt, ReadFromBytes};

/// Data of UserVarEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/user-var-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct UserVarData {
    pub name: Bytes,
    pub is_null: u8,
    // value is lazy evaluated
    pub value: Bytes,
}

impl UserVarData {
    /// parse the value part, returns None if variable is null
    pub fn value(&self) -> Result<Option<UserVarValue>> {
        if self.is_null != 0 {
            return Ok(None);
        }
        UserVarValue::read_from(&mut self.value.clone()).map(Some)
    }
}

impl ReadFromBytes for UserVarData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let name_length = input.read_le_u32()?;
        let name = input.read_len(name_length as usize)?;
        let is_null = input.read_u8()?;
        let value = input.split_to(input.remaining());
        Ok(UserVarData {
            name,
            is_null,
            value,
        })
    }
}

/// value part of UserVarEvent
///
/// reference: https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/statement_events.h
#[derive(Debug, Clone, PartialEq)]
pub struct UserVarValue {
    pub value_type: u8,
    pub charset_num: u32,
    pub value: Bytes,
    pub flags: UserVarFlags,
}

impl ReadFromBytes for UserVarValue {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let value_type = input.read_u8()?;
        let charset_num = input.read_le_u32()?;
        let value_len = input.read_le_u32()?;
        let value = input.read_len(value_len as usize)?;
        // flags is optional
        let flags = if input.has_remaining() {
            input.read_u8()?
        } else {
            0
        };
        let flags = UserVarFlags::from_bits(flags).ok_or_else(|| {
            Error::ConstraintError(format!("invalid user var flags {:02x}", flags))
        })?;
        Ok(UserVarValue {
            value_type,
            charset_num,
            value,
            flags,
        })
    }
}

bitflags! {
    pub struct UserVarFlags: u8 {
        const UNSIGNED = 0x01;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_var_data() -> Result<()> {
        let mut input = Bytes::from_static(
            b"\x01\x00\x00\x00a\x00\x02\x21\x00\x00\x00\x08\x00\x00\x00\x01\x00\x00\x00\x00\x00\x00\x00\x01",
        );
        let data = UserVarData::read_from(&mut input)?;
        assert_eq!(&b"a"[..], &data.name[..]);
        let value = data.value()?.expect("not null");
        assert_eq!(2, value.value_type);
        assert_eq!(33, value.charset_num);
        assert_eq!(8, value.value.len());
        assert_eq!(UserVarFlags::UNSIGNED, value.flags);
        Ok(())
    }

    #[test]
    fn test_null_user_var() -> Result<()> {
        let mut input = Bytes::from_static(b"\x01\x00\x00\x00b\x01");
        let data = UserVarData::read_from(&mut input)?;
        assert_eq!(None, data.value()?);
        Ok(())
    }
}

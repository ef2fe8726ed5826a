use crate::bytes::{ensure, ReadBytesExt, WriteBytesExt};
use crate::error::{Error, Result};
use crate::WriteToBytes;
use bytes::{Buf, Bytes, BytesMut};
use std::convert::TryFrom;

/// read MySQL encoded types
pub trait ReadMyEnc {
    /// read a MySQL length encoded integer
    fn read_len_enc_int(&mut self) -> Result<LenEncInt>;

    /// read a MySQL length encoded string
    fn read_len_enc_str(&mut self) -> Result<LenEncStr>;

    /// read a packed integer that must be present and fit into u32
    fn read_packed_u32(&mut self) -> Result<u32>;

    /// read a packed integer that must be present
    fn read_packed_u64(&mut self) -> Result<u64>;
}

impl ReadMyEnc for Bytes {
    fn read_len_enc_int(&mut self) -> Result<LenEncInt> {
        ensure(self, 1)?;
        // check full width before consuming anything
        let width = match self[0] {
            0xfc => 3,
            0xfd => 4,
            0xfe => 9,
            _ => 1,
        };
        ensure(self, width)?;
        let len = self.get_u8();
        let lei = match len {
            0xfb => LenEncInt::Null,
            0xfc => LenEncInt::Len3(self.read_le_u16()?),
            0xfd => LenEncInt::Len4(self.read_le_u24()?),
            0xfe => LenEncInt::Len9(self.read_le_u64()?),
            0xff => LenEncInt::Err,
            _ => LenEncInt::Len1(len),
        };
        Ok(lei)
    }

    fn read_len_enc_str(&mut self) -> Result<LenEncStr> {
        let mut peek = self.clone();
        let lei = peek.read_len_enc_int()?;
        let les = match lei.to_u64() {
            None if lei == LenEncInt::Null => LenEncStr::Null,
            None => LenEncStr::Err,
            Some(len) => {
                let len = usize::try_from(len).map_err(|_| {
                    Error::ConstraintError(format!("string length {} exceeds usize", len))
                })?;
                let bs = peek.read_len(len)?;
                LenEncStr::Bytes(bs)
            }
        };
        *self = peek;
        Ok(les)
    }

    fn read_packed_u32(&mut self) -> Result<u32> {
        let n = self.read_packed_u64()?;
        u32::try_from(n)
            .map_err(|_| Error::ConstraintError(format!("packed integer {} exceeds u32", n)))
    }

    fn read_packed_u64(&mut self) -> Result<u64> {
        let lei = self.read_len_enc_int()?;
        lei.to_u64()
            .ok_or_else(|| Error::ConstraintError(format!("invalid packed integer {:?}", lei)))
    }
}

/// MySQL length encoded integer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LenEncInt {
    Null,
    Err,
    Len1(u8),
    Len3(u16),
    Len4(u32),
    Len9(u64),
}

impl LenEncInt {
    pub fn to_u64(&self) -> Option<u64> {
        match self {
            LenEncInt::Len1(n) => Some(*n as u64),
            LenEncInt::Len3(n) => Some(*n as u64),
            LenEncInt::Len4(n) => Some(*n as u64),
            LenEncInt::Len9(n) => Some(*n),
            _ => None,
        }
    }

    /// number of bytes taken by the encoded form
    pub fn encoded_len(&self) -> usize {
        match self {
            LenEncInt::Null | LenEncInt::Err | LenEncInt::Len1(_) => 1,
            LenEncInt::Len3(_) => 3,
            LenEncInt::Len4(_) => 4,
            LenEncInt::Len9(_) => 9,
        }
    }
}

impl From<u8> for LenEncInt {
    fn from(n: u8) -> Self {
        LenEncInt::from(n as u64)
    }
}

impl From<u16> for LenEncInt {
    fn from(n: u16) -> Self {
        LenEncInt::from(n as u64)
    }
}

impl From<u32> for LenEncInt {
    fn from(n: u32) -> Self {
        LenEncInt::from(n as u64)
    }
}

impl From<u64> for LenEncInt {
    fn from(n: u64) -> Self {
        if n < 0xfb {
            LenEncInt::Len1(n as u8)
        } else if n <= 0xffff {
            LenEncInt::Len3(n as u16)
        } else if n <= 0xff_ffff {
            LenEncInt::Len4(n as u32)
        } else {
            LenEncInt::Len9(n)
        }
    }
}

impl WriteToBytes for LenEncInt {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        match self {
            LenEncInt::Null => len += out.write_u8(0xfb)?,
            LenEncInt::Err => len += out.write_u8(0xff)?,
            LenEncInt::Len1(n) => len += out.write_u8(n)?,
            LenEncInt::Len3(n) => {
                len += out.write_u8(0xfc)?;
                len += out.write_le_u16(n)?;
            }
            LenEncInt::Len4(n) => {
                len += out.write_u8(0xfd)?;
                len += out.write_le_u24(n)?;
            }
            LenEncInt::Len9(n) => {
                len += out.write_u8(0xfe)?;
                len += out.write_le_u64(n)?;
            }
        }
        Ok(len)
    }
}

/// MySQL length encoded string
#[derive(Debug, Clone, PartialEq)]
pub enum LenEncStr {
    Null,
    Bytes(Bytes),
    Err,
}

impl LenEncStr {
    pub fn into_string(self) -> Result<Option<String>> {
        match self {
            LenEncStr::Bytes(bs) => Ok(Some(String::from_utf8(bs.to_vec())?)),
            _ => Ok(None),
        }
    }
}

impl WriteToBytes for LenEncStr {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        match self {
            LenEncStr::Null => len += LenEncInt::Null.write_to(out)?,
            LenEncStr::Err => len += LenEncInt::Err.write_to(out)?,
            LenEncStr::Bytes(bs) => {
                len += LenEncInt::from(bs.len() as u64).write_to(out)?;
                len += out.write_bytes(bs)?;
            }
        }
        Ok(len)
    }
}

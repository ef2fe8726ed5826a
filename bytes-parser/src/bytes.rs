use crate::error::{Error, Needed, Result};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// read fixed-width numbers and byte slices from head of input
///
/// on failure the input is left untouched.
pub trait ReadBytesExt {
    /// read single byte
    fn read_u8(&mut self) -> Result<u8>;

    /// read 2 bytes as u16 in little endian byte order
    fn read_le_u16(&mut self) -> Result<u16>;

    /// read 3 bytes as u32 in little endian byte order
    fn read_le_u24(&mut self) -> Result<u32>;

    /// read 4 bytes as u32 in little endian byte order
    fn read_le_u32(&mut self) -> Result<u32>;

    /// read 6 bytes as u64 in little endian byte order
    fn read_le_u48(&mut self) -> Result<u64>;

    /// read 8 bytes as u64 in little endian byte order
    fn read_le_u64(&mut self) -> Result<u64>;

    /// read 16 bytes as u128 in little endian byte order
    fn read_le_u128(&mut self) -> Result<u128>;

    /// take exactly len bytes
    fn read_len(&mut self, len: usize) -> Result<Bytes>;

    /// take bytes until encountering given byte
    ///
    /// the end byte is always consumed, but only included
    /// in the returned slice if inclusive flag is set.
    fn read_until(&mut self, b: u8, inclusive: bool) -> Result<Bytes>;

    #[inline]
    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    #[inline]
    fn read_le_i16(&mut self) -> Result<i16> {
        Ok(self.read_le_u16()? as i16)
    }

    #[inline]
    fn read_le_i24(&mut self) -> Result<i32> {
        let value = self.read_le_u24()?;
        let value = if value & 0x80_0000 != 0 {
            (value | 0xff00_0000) as i32
        } else {
            value as i32
        };
        Ok(value)
    }

    #[inline]
    fn read_le_i32(&mut self) -> Result<i32> {
        Ok(self.read_le_u32()? as i32)
    }

    #[inline]
    fn read_le_i64(&mut self) -> Result<i64> {
        Ok(self.read_le_u64()? as i64)
    }
}

#[inline]
pub(crate) fn ensure(input: &Bytes, len: usize) -> Result<()> {
    if input.remaining() < len {
        return Err(Error::InputIncomplete(
            input.clone(),
            Needed::Size(len - input.remaining()),
        ));
    }
    Ok(())
}

impl ReadBytesExt for Bytes {
    fn read_u8(&mut self) -> Result<u8> {
        ensure(self, 1)?;
        Ok(self.get_u8())
    }

    fn read_le_u16(&mut self) -> Result<u16> {
        ensure(self, 2)?;
        Ok(self.get_u16_le())
    }

    fn read_le_u24(&mut self) -> Result<u32> {
        ensure(self, 3)?;
        Ok(self.get_uint_le(3) as u32)
    }

    fn read_le_u32(&mut self) -> Result<u32> {
        ensure(self, 4)?;
        Ok(self.get_u32_le())
    }

    fn read_le_u48(&mut self) -> Result<u64> {
        ensure(self, 6)?;
        Ok(self.get_uint_le(6))
    }

    fn read_le_u64(&mut self) -> Result<u64> {
        ensure(self, 8)?;
        Ok(self.get_u64_le())
    }

    fn read_le_u128(&mut self) -> Result<u128> {
        ensure(self, 16)?;
        Ok(self.get_u128_le())
    }

    fn read_len(&mut self, len: usize) -> Result<Bytes> {
        ensure(self, len)?;
        Ok(self.split_to(len))
    }

    fn read_until(&mut self, b: u8, inclusive: bool) -> Result<Bytes> {
        match self.iter().position(|&x| x == b) {
            Some(pos) => {
                let mut r = self.split_to(pos + 1);
                if !inclusive {
                    r.truncate(pos);
                }
                Ok(r)
            }
            None => Err(Error::InputIncomplete(self.clone(), Needed::Unknown)),
        }
    }
}

/// write fixed-width numbers and byte slices to tail of output
pub trait WriteBytesExt {
    fn write_u8(&mut self, n: u8) -> Result<usize>;

    fn write_le_u16(&mut self, n: u16) -> Result<usize>;

    fn write_le_u24(&mut self, n: u32) -> Result<usize>;

    fn write_le_u32(&mut self, n: u32) -> Result<usize>;

    fn write_le_u48(&mut self, n: u64) -> Result<usize>;

    fn write_le_u64(&mut self, n: u64) -> Result<usize>;

    fn write_bytes<T: AsRef<[u8]>>(&mut self, bs: T) -> Result<usize>;
}

impl WriteBytesExt for BytesMut {
    fn write_u8(&mut self, n: u8) -> Result<usize> {
        self.put_u8(n);
        Ok(1)
    }

    fn write_le_u16(&mut self, n: u16) -> Result<usize> {
        self.put_u16_le(n);
        Ok(2)
    }

    fn write_le_u24(&mut self, n: u32) -> Result<usize> {
        debug_assert!(n <= 0xff_ffff);
        self.put_uint_le(n as u64, 3);
        Ok(3)
    }

    fn write_le_u32(&mut self, n: u32) -> Result<usize> {
        self.put_u32_le(n);
        Ok(4)
    }

    fn write_le_u48(&mut self, n: u64) -> Result<usize> {
        debug_assert!(n <= 0xffff_ffff_ffff_u64);
        self.put_uint_le(n, 6);
        Ok(6)
    }

    fn write_le_u64(&mut self, n: u64) -> Result<usize> {
        self.put_u64_le(n);
        Ok(8)
    }

    fn write_bytes<T: AsRef<[u8]>>(&mut self, bs: T) -> Result<usize> {
        let bs = bs.as_ref();
        self.extend_from_slice(bs);
        Ok(bs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_numbers() -> Result<()> {
        let mut input = Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(1, input.read_u8()?);
        assert_eq!(2 + (3u16 << 8), input.read_le_u16()?);
        assert_eq!(4 + (5u32 << 8) + (6u32 << 16), input.read_le_u24()?);
        assert_eq!(
            7 + (8u32 << 8) + (9u32 << 16) + (10u32 << 24),
            input.read_le_u32()?
        );
        assert_eq!(1, input.remaining());
        Ok(())
    }

    #[test]
    fn test_read_incomplete_keeps_input() {
        let mut input = Bytes::from_static(&[1, 2, 3]);
        match input.read_le_u32() {
            Err(Error::InputIncomplete(rest, Needed::Size(1))) => assert_eq!(3, rest.len()),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(3, input.remaining());
    }

    #[test]
    fn test_read_le_u48_and_signed() -> Result<()> {
        let mut input = Bytes::from_static(&[1, 2, 3, 4, 1, 2, 0xff, 0xff, 0xff]);
        assert_eq!(
            1u64 + (2u64 << 8) + (3u64 << 16) + (4u64 << 24) + (1u64 << 32) + (2u64 << 40),
            input.read_le_u48()?
        );
        assert_eq!(-1, input.read_le_i24()?);
        Ok(())
    }

    #[test]
    fn test_read_len() -> Result<()> {
        let mut input = Bytes::from_static(&[1, 2, 3, 4, 5]);
        let r = input.read_len(3)?;
        assert_eq!(&[1, 2, 3][..], &r[..]);
        assert_eq!(2, input.remaining());
        assert!(input.read_len(3).is_err());
        Ok(())
    }

    #[test]
    fn test_read_until() -> Result<()> {
        let mut input = Bytes::from_static(&[1u8, 2, 3, 4, 5]);
        let r = input.read_until(3, false)?;
        assert_eq!(&[1, 2][..], &r[..]);
        assert_eq!(&[4, 5][..], &input[..]);

        let mut input = Bytes::from_static(&[1u8, 2, 3, 4, 5]);
        let r = input.read_until(3, true)?;
        assert_eq!(&[1, 2, 3][..], &r[..]);
        assert!(input.read_until(6, false).is_err());
        Ok(())
    }

    #[test]
    fn test_write_numbers() -> Result<()> {
        let mut out = BytesMut::new();
        let mut len = 0;
        len += out.write_u8(1)?;
        len += out.write_le_u16(0x0302)?;
        len += out.write_le_u24(0x06_0504)?;
        len += out.write_le_u48(0x0c0b_0a09_0807)?;
        len += out.write_bytes(b"xy")?;
        assert_eq!(14, len);
        assert_eq!(
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, b'x', b'y'][..],
            &out[..]
        );
        Ok(())
    }
}

use crc_any::CRCu32;
use std::io::{self, Read};

pub(crate) fn checksum_crc32(bytes: &[u8]) -> u32 {
    let mut hasher = CRCu32::crc32();
    hasher.digest(bytes);
    hasher.get_crc()
}

/// read until buf is full or source is exhausted, returns bytes filled
pub(crate) fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_iso_3309() {
        assert_eq!(907060870, checksum_crc32(b"hello"));
        assert_eq!(980881731, checksum_crc32(b"world"));
    }

    /// yields at most 3 bytes per read call
    struct Chunked<'a>(&'a [u8]);

    impl Read for Chunked<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.0.len().min(buf.len()).min(3);
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_full() -> io::Result<()> {
        let mut src = Chunked(b"hello world");
        let mut buf = [0u8; 8];
        assert_eq!(8, read_full(&mut src, &mut buf)?);
        assert_eq!(b"hello wo", &buf);
        assert_eq!(3, read_full(&mut src, &mut buf)?);
        assert_eq!(0, read_full(&mut src, &mut buf)?);
        Ok(())
    }
}

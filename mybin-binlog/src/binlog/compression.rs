//! compression algorithms of transaction payload
use crate::error::{Error, Result};
use bytes::buf::Reader;
use bytes::{Buf, Bytes};
use std::io::{self, Read};

/// compression code of zstd as written by mysql
pub const COMPRESSION_ZSTD: u32 = 0;
/// alternative code accepted as zstd
pub const COMPRESSION_ZSTD_ALT: u32 = 1;
/// payload is stored without compression
pub const COMPRESSION_NONE: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompressionType {
    Zstd,
    None,
    Unknown(u32),
}

impl From<u32> for CompressionType {
    fn from(code: u32) -> CompressionType {
        match code {
            COMPRESSION_ZSTD | COMPRESSION_ZSTD_ALT => CompressionType::Zstd,
            COMPRESSION_NONE => CompressionType::None,
            _ => CompressionType::Unknown(code),
        }
    }
}

impl From<CompressionType> for u32 {
    fn from(ct: CompressionType) -> u32 {
        match ct {
            CompressionType::Zstd => COMPRESSION_ZSTD,
            CompressionType::None => COMPRESSION_NONE,
            CompressionType::Unknown(code) => code,
        }
    }
}

/// streaming decompression over an owned payload
///
/// decompressed bytes are produced on demand, the zstd context
/// is released when the decompressor is dropped.
pub struct Decompressor {
    inner: Inner,
    error: Option<String>,
}

enum Inner {
    Zstd(zstd::stream::read::Decoder<'static, Reader<Bytes>>),
    Stored(Reader<Bytes>),
}

impl Decompressor {
    pub fn new(compression: CompressionType, payload: Bytes) -> Result<Self> {
        let inner = match compression {
            CompressionType::Zstd => {
                let decoder = zstd::stream::read::Decoder::with_buffer(payload.reader())
                    .map_err(|e| Error::CorruptCompressedData(e.to_string()))?;
                Inner::Zstd(decoder)
            }
            CompressionType::None => Inner::Stored(payload.reader()),
            CompressionType::Unknown(code) => return Err(Error::UnsupportedCompression(code)),
        };
        Ok(Decompressor { inner, error: None })
    }

    /// takes the error raised by the decompression stream, if any
    ///
    /// used to tell corrupt input apart from errors of the consumer.
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take()
    }
}

impl Read for Decompressor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let res = match &mut self.inner {
            Inner::Zstd(decoder) => decoder.read(buf),
            Inner::Stored(reader) => reader.read(buf),
        };
        if let Err(e) = &res {
            if e.kind() != io::ErrorKind::Interrupted {
                self.error = Some(e.to_string());
            }
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(n: usize) -> Vec<u8> {
        (0..n).map(|i| b"binlog"[i % 6]).collect()
    }

    #[test]
    fn test_compression_type() {
        assert_eq!(CompressionType::Zstd, CompressionType::from(0));
        assert_eq!(CompressionType::Zstd, CompressionType::from(1));
        assert_eq!(CompressionType::None, CompressionType::from(255));
        assert_eq!(CompressionType::Unknown(2), CompressionType::from(2));
        assert_eq!(255u32, u32::from(CompressionType::None));
        assert_eq!(7u32, u32::from(CompressionType::Unknown(7)));
    }

    #[test]
    fn test_zstd_stream() -> Result<()> {
        let plain = text(100_000);
        let compressed = zstd::encode_all(&plain[..], 3)?;
        assert!(compressed.len() < plain.len());
        let mut d = Decompressor::new(CompressionType::Zstd, Bytes::from(compressed))?;
        let mut out = Vec::new();
        d.read_to_end(&mut out)?;
        assert_eq!(plain, out);
        assert_eq!(None, d.take_error());
        Ok(())
    }

    #[test]
    fn test_truncated_zstd_stream() -> Result<()> {
        let compressed = zstd::encode_all(&text(100_000)[..], 3)?;
        let truncated = Bytes::copy_from_slice(&compressed[..compressed.len() / 2]);
        let mut d = Decompressor::new(CompressionType::Zstd, truncated)?;
        let mut out = Vec::new();
        assert!(d.read_to_end(&mut out).is_err());
        assert!(d.take_error().is_some());
        Ok(())
    }

    #[test]
    fn test_garbage_zstd_stream() -> Result<()> {
        let mut d = Decompressor::new(
            CompressionType::Zstd,
            Bytes::from_static(b"definitely not zstd"),
        )?;
        let mut out = Vec::new();
        assert!(d.read_to_end(&mut out).is_err());
        assert!(d.take_error().is_some());
        Ok(())
    }

    #[test]
    fn test_stored_stream() -> Result<()> {
        let mut d = Decompressor::new(CompressionType::None, Bytes::from_static(b"raw"))?;
        let mut out = Vec::new();
        d.read_to_end(&mut out)?;
        assert_eq!(b"raw".to_vec(), out);
        Ok(())
    }

    #[test]
    fn test_unsupported_compression() {
        match Decompressor::new(CompressionType::Unknown(2), Bytes::new()) {
            Err(Error::UnsupportedCompression(2)) => (),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("unexpected decompressor"),
        }
    }
}

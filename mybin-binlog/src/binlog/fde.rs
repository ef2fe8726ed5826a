//! format description event
use super::{LogEventType, LogEventTypeCode};
use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// fixed part of FDE body: binlog version, server version, create timestamp, header length
const FDE_FIXED_LEN: u8 = 2 + 50 + 4 + 1;

/// checksum algorithm flag of crc32
pub const CHECKSUM_CRC32: u8 = 1;

/// post header lengths written by mysql 8.0, indexed by type code - 1
pub const POST_HEADER_LENGTHS_V8_0: [u8; 41] = [
    56, 13, 0, 8, 0, 18, 0, 4, 4, 4, 4, 18, 0, 0, 98, 0, 4, 26, 8, 0, 0, 0, 8, 8, 8, 2, 0, 0, 0,
    10, 10, 10, 42, 42, 0, 18, 52, 0, 10, 0, 0,
];

/// Data of FormatDescriptionEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/format-description-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDescriptionData {
    pub binlog_version: u16,
    pub server_version: String,
    pub create_timestamp: u32,
    pub header_length: u8,
    pub post_header_lengths: Vec<u8>,
    // only record checksum flag, should be 0 or 1 after mysql 5.6.1
    // in case of earlier version, set 0
    pub checksum_flag: u8,
}

impl FormatDescriptionData {
    /// v4 data as written by mysql 8.0
    pub fn new(server_version: impl Into<String>, checksum_flag: u8) -> Self {
        FormatDescriptionData {
            binlog_version: 4,
            server_version: server_version.into(),
            create_timestamp: 0,
            header_length: 19,
            post_header_lengths: POST_HEADER_LENGTHS_V8_0.to_vec(),
            checksum_flag,
        }
    }

    pub fn checksum_enabled(&self) -> bool {
        self.checksum_flag == CHECKSUM_CRC32
    }

    /// post header length of given event type
    pub fn post_header_length(&self, event_type: LogEventType) -> Option<u8> {
        let code = LogEventTypeCode::from(event_type).0 as usize;
        code.checked_sub(1)
            .and_then(|idx| self.post_header_lengths.get(idx))
            .cloned()
    }
}

/// FDE is the first event in binlog, so its own post header length
/// is read from the table it carries.
///
/// the trailing crc32 checksum is left in input.
impl ReadFromBytes for FormatDescriptionData {
    fn read_from(input: &mut Bytes) -> Result<FormatDescriptionData> {
        let binlog_version = input.read_le_u16()?;
        let server_version = input.read_len(50)?;
        let server_version = match server_version.iter().position(|&b| b == 0) {
            Some(pos) => server_version.slice(..pos),
            None => server_version,
        };
        let server_version = String::from_utf8(server_version.to_vec())?;
        let create_timestamp = input.read_le_u32()?;
        let header_length = input.read_u8()?;
        // before mysql 5.6.1, there is no checksum so the data len is
        // same as total size of all 5 fields
        // from 5.6.1, 1-byte checksum flag and 4-byte checksum follow
        // the post header lengths
        let fde_idx = LogEventTypeCode::from(LogEventType::FormatDescriptionEvent).0 as usize - 1;
        let fde_post_header_len = *input.get(fde_idx).ok_or_else(|| {
            Error::ConstraintError(format!(
                "post header lengths too short: {}",
                input.remaining()
            ))
        })?;
        let n_lengths = fde_post_header_len.checked_sub(FDE_FIXED_LEN).ok_or_else(|| {
            Error::ConstraintError(format!(
                "invalid post header length of format description event: {}",
                fde_post_header_len
            ))
        })? as usize;
        let post_header_lengths = input.read_len(n_lengths)?.to_vec();
        let checksum_flag = if input.has_remaining() {
            input.read_u8()?
        } else {
            0
        };
        Ok(FormatDescriptionData {
            binlog_version,
            server_version,
            create_timestamp,
            header_length,
            post_header_lengths,
            checksum_flag,
        })
    }
}

impl WriteToBytes for FormatDescriptionData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let sv = self.server_version.as_bytes();
        if sv.len() >= 50 {
            return Err(Error::ConstraintError(format!(
                "server version too long: {}",
                self.server_version
            )));
        }
        let mut len = 0;
        len += out.write_le_u16(self.binlog_version)?;
        len += out.write_bytes(sv)?;
        len += out.write_bytes(&[0u8; 50][..50 - sv.len()])?;
        len += out.write_le_u32(self.create_timestamp)?;
        len += out.write_u8(self.header_length)?;
        len += out.write_bytes(&self.post_header_lengths)?;
        len += out.write_u8(self.checksum_flag)?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fde_post_header_lengths() {
        let fde = FormatDescriptionData::new("8.0.21", CHECKSUM_CRC32);
        assert_eq!(
            Some(FDE_FIXED_LEN + 41),
            fde.post_header_length(LogEventType::FormatDescriptionEvent)
        );
        assert_eq!(Some(13), fde.post_header_length(LogEventType::QueryEvent));
        assert_eq!(Some(8), fde.post_header_length(LogEventType::TableMapEvent));
        assert_eq!(None, fde.post_header_length(LogEventType::Unknown));
        assert!(fde.checksum_enabled());
    }

    #[test]
    fn test_fde_read_with_trailing_checksum() -> Result<()> {
        let fde = FormatDescriptionData::new("8.0.21-log", CHECKSUM_CRC32);
        let mut out = BytesMut::new();
        fde.clone().write_to(&mut out)?;
        out.write_le_u32(0xdead_beef)?;
        let mut input = out.freeze();
        let parsed = FormatDescriptionData::read_from(&mut input)?;
        assert_eq!(fde, parsed);
        assert_eq!(0xdead_beef, input.read_le_u32()?);
        Ok(())
    }

    #[test]
    fn test_fde_read_without_checksum_flag() -> Result<()> {
        let fde = FormatDescriptionData::new("5.5.50", 0);
        let mut out = BytesMut::new();
        fde.clone().write_to(&mut out)?;
        // drop the checksum flag, as written by servers before 5.6.1
        out.truncate(out.len() - 1);
        let parsed = FormatDescriptionData::read_from(&mut out.freeze())?;
        assert_eq!(fde, parsed);
        assert!(!parsed.checksum_enabled());
        Ok(())
    }

    #[test]
    fn test_fde_invalid_post_header_length() {
        let mut fde = FormatDescriptionData::new("8.0.21", 0);
        fde.post_header_lengths[14] = 10;
        let mut out = BytesMut::new();
        assert!(fde.write_to(&mut out).is_ok());
        assert!(FormatDescriptionData::read_from(&mut out.freeze()).is_err());
    }
}

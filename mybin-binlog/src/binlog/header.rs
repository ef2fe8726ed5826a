use super::{LogEventType, LogEventTypeCode};
use bitflags::bitflags;
use bytes::{Bytes, BytesMut};
use bytes_parser::error::Result;
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// length of v4 common header
pub const EVENT_HEADER_LEN: usize = 19;

bitflags! {
    pub struct EventHeaderFlags: u16 {
        const BINLOG_IN_USE         = 0x0001;
        const FORCED_ROTATE         = 0x0002;
        const THREAD_SPECIFIC       = 0x0004;
        const SUPRESS_USE           = 0x0008;
        const UPDATE_TABLE_MAP_VERSION  = 0x0010;
        const ARTIFICIAL            = 0x0020;
        const RELAY_LOG             = 0x0040;
        const IGNORABLE             = 0x0080;
        const NO_FILTER             = 0x0100;
        const MTS_ISOLATE           = 0x0200;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventHeader {
    pub timestamp: u32,
    pub type_code: LogEventTypeCode,
    pub server_id: u32,
    pub event_len: u32,
    pub next_pos: u32,
    pub flags: EventHeaderFlags,
}

impl EventHeader {
    /// header with given type, lengths are filled when the event is written
    pub fn new(event_type: LogEventType, timestamp: u32, server_id: u32) -> Self {
        EventHeader {
            timestamp,
            type_code: LogEventTypeCode::from(event_type),
            server_id,
            event_len: EVENT_HEADER_LEN as u32,
            next_pos: 0,
            flags: EventHeaderFlags::empty(),
        }
    }

    /// equals event_length - 19, including checksum if any
    pub fn data_len(&self) -> u32 {
        self.event_len.saturating_sub(EVENT_HEADER_LEN as u32)
    }

    pub fn event_type(&self) -> LogEventType {
        LogEventType::from(self.type_code)
    }
}

/// parse v4 common header
///
/// timestamp 0:4, type_code 4:1, server_id: 5:4,
/// event_length: 9:4, next_position: 13:4, flags 17:2
impl ReadFromBytes for EventHeader {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let timestamp = input.read_le_u32()?;
        let type_code = input.read_u8()?;
        let server_id = input.read_le_u32()?;
        let event_len = input.read_le_u32()?;
        let next_pos = input.read_le_u32()?;
        let flags = input.read_le_u16()?;
        Ok(EventHeader {
            timestamp,
            type_code: LogEventTypeCode(type_code),
            server_id,
            event_len,
            next_pos,
            flags: EventHeaderFlags::from_bits_truncate(flags),
        })
    }
}

impl WriteToBytes for EventHeader {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = 0;
        len += out.write_le_u32(self.timestamp)?;
        len += out.write_u8(self.type_code.0)?;
        len += out.write_le_u32(self.server_id)?;
        len += out.write_le_u32(self.event_len)?;
        len += out.write_le_u32(self.next_pos)?;
        len += out.write_le_u16(self.flags.bits())?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_event_header() -> Result<()> {
        let mut input = Bytes::from_static(&[
            0x10, 0, 0, 0, 0x02, 0x01, 0, 0, 0, 0x30, 0, 0, 0, 0x40, 0, 0, 0, 0x08, 0,
        ]);
        let header = EventHeader::read_from(&mut input)?;
        assert_eq!(16, header.timestamp);
        assert_eq!(LogEventType::QueryEvent, header.event_type());
        assert_eq!(1, header.server_id);
        assert_eq!(48, header.event_len);
        assert_eq!(29, header.data_len());
        assert_eq!(64, header.next_pos);
        assert_eq!(EventHeaderFlags::SUPRESS_USE, header.flags);
        assert!(input.is_empty());
        Ok(())
    }

    #[test]
    fn test_write_event_header() -> Result<()> {
        let mut header = EventHeader::new(LogEventType::XidEvent, 100, 7);
        header.event_len = 31;
        let mut out = BytesMut::new();
        assert_eq!(EVENT_HEADER_LEN, header.clone().write_to(&mut out)?);
        let parsed = EventHeader::read_from(&mut out.freeze())?;
        assert_eq!(header, parsed);
        Ok(())
    }
}

use bytes::Bytes;
use bytes_parser::error::Result;
use bytes_parser::{ReadBytesExt, ReadFromBytes};

/// Data of IncidentEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/incident-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentData {
    // https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/control_events.h
    pub incident_type: u16,
    // below is variable part
    pub msg: Bytes,
}

impl ReadFromBytes for IncidentData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let incident_type = input.read_le_u16()?;
        let msg_len = input.read_u8()?;
        let msg = input.read_len(msg_len as usize)?;
        Ok(IncidentData { incident_type, msg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_data() -> Result<()> {
        let mut input = Bytes::from_static(b"\x01\x00\x0bLOST_EVENTS");
        let data = IncidentData::read_from(&mut input)?;
        assert_eq!(1, data.incident_type);
        assert_eq!(&b"LOST_EVENTS"[..], &data.msg[..]);

        let mut input = Bytes::from_static(b"\x01\x00\x0cLOST_EVENTS");
        assert!(IncidentData::read_from(&mut input).is_err());
        Ok(())
    }
}

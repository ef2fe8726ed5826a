use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::Result;
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// Data of RotateEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/rotate-event.html
#[derive(Debug, Clone, PartialEq)]
pub struct RotateData {
    pub position: u64,
    // below is variable part
    pub next_binlog_filename: Bytes,
}

impl ReadFromBytes for RotateData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let position = input.read_le_u64()?;
        let next_binlog_filename = input.split_to(input.remaining());
        Ok(RotateData {
            position,
            next_binlog_filename,
        })
    }
}

impl WriteToBytes for RotateData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_le_u64(self.position)?;
        len += out.write_bytes(self.next_binlog_filename)?;
        Ok(len)
    }
}

/// Data of HeartbeatLogEvent
///
/// only carries the binlog file name the master is currently writing,
/// the position is in the event header.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatData {
    pub log_ident: Bytes,
}

impl ReadFromBytes for HeartbeatData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let log_ident = input.split_to(input.remaining());
        Ok(HeartbeatData { log_ident })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_data() -> Result<()> {
        let data = RotateData {
            position: 4,
            next_binlog_filename: Bytes::from_static(b"mysql-bin.000002"),
        };
        let mut out = BytesMut::new();
        assert_eq!(24, data.clone().write_to(&mut out)?);
        assert_eq!(data, RotateData::read_from(&mut out.freeze())?);
        Ok(())
    }

    #[test]
    fn test_heartbeat_data() -> Result<()> {
        let mut input = Bytes::from_static(b"mysql-bin.000003");
        let data = HeartbeatData::read_from(&mut input)?;
        assert_eq!(&b"mysql-bin.000003"[..], &data.log_ident[..]);
        assert!(input.is_empty());
        Ok(())
    }
}

//! gtid related events and parsing logic
use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};
use linked_hash_map::LinkedHashMap;

/// Data of GtidLogEvent and AnonymousGtidLogEvent
///
/// reference: https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/control_events.h
#[derive(Debug, Clone, PartialEq)]
pub struct GtidLogData {
    pub gtid_flags: u8,
    // from source code
    pub encoded_sid: u128,
    pub encoded_gno: u64,
    // below fields may not exist
    // in versions earlier than 5.7.4
    pub ts_type: u8,
    pub last_committed: u64,
    pub seq_num: u64,
}

impl ReadFromBytes for GtidLogData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let gtid_flags = input.read_u8()?;
        let encoded_sid = input.read_le_u128()?;
        let encoded_gno = input.read_le_u64()?;
        // consumed 25 bytes now
        let (ts_type, last_committed, seq_num) = if input.remaining() >= 17 {
            (input.read_u8()?, input.read_le_u64()?, input.read_le_u64()?)
        } else {
            (0, 0, 0)
        };
        // commit timestamps and transaction length of 8.0 are not parsed
        input.advance(input.remaining());
        Ok(GtidLogData {
            gtid_flags,
            encoded_sid,
            encoded_gno,
            ts_type,
            last_committed,
            seq_num,
        })
    }
}

impl WriteToBytes for GtidLogData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_u8(self.gtid_flags)?;
        len += out.write_bytes(self.encoded_sid.to_le_bytes())?;
        len += out.write_le_u64(self.encoded_gno)?;
        len += out.write_u8(self.ts_type)?;
        len += out.write_le_u64(self.last_committed)?;
        len += out.write_le_u64(self.seq_num)?;
        Ok(len)
    }
}

/// Data of PreviousGtidsEvent
///
/// reference: https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/control_events.h
#[derive(Debug, Clone, PartialEq)]
pub struct PreviousGtidsLogData {
    pub payload: Bytes,
}

impl PreviousGtidsLogData {
    pub fn gtid_set(&self) -> Result<GtidSet> {
        let mut payload = self.payload.clone();
        GtidSet::read_from(&mut payload)
    }
}

impl ReadFromBytes for PreviousGtidsLogData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let payload = input.split_to(input.remaining());
        Ok(PreviousGtidsLogData { payload })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GtidSet {
    sids: LinkedHashMap<u128, GtidRange>,
}

impl GtidSet {
    pub fn get(&self, sid: u128) -> Option<&GtidRange> {
        self.sids.get(&sid)
    }

    /// ranges in the order of appearance
    pub fn ranges(&self) -> impl Iterator<Item = &GtidRange> {
        self.sids.values()
    }

    pub fn len(&self) -> usize {
        self.sids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sids.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GtidRange {
    pub sid: u128,
    pub intervals: Vec<GtidInterval>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GtidInterval {
    pub start: u64,
    // inclusive
    pub end: u64,
}

/// parse gtid set from payload of PreviousGtidsLogEvent
///
/// layout on mysql dev website is wrong, follow source code:
/// https://github.com/mysql/mysql-server/blob/8.0/sql/rpl_gtid_set.cc
impl ReadFromBytes for GtidSet {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let n_sids = input.read_le_u64()? as usize;
        let mut sids = LinkedHashMap::new();
        for _ in 0..n_sids {
            let gtid_range = GtidRange::read_from(input)?;
            if sids.contains_key(&gtid_range.sid) {
                return Err(Error::ConstraintError(format!(
                    "duplicate sid in gtid set: {:032x}",
                    gtid_range.sid
                )));
            }
            sids.insert(gtid_range.sid, gtid_range);
        }
        Ok(GtidSet { sids })
    }
}

impl ReadFromBytes for GtidRange {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let sid = input.read_le_u128()?;
        let n_intervals = input.read_le_u64()? as usize;
        let mut last = 0u64;
        let mut intervals = Vec::new();
        for _ in 0..n_intervals {
            let start = input.read_le_u64()?;
            let end = input.read_le_u64()?;
            if start <= last || end <= start {
                return Err(Error::ConstraintError(format!(
                    "invalid gtid range: start={}, end={}, last={}",
                    start, end, last
                )));
            }
            last = end;
            // stored end is exclusive
            intervals.push(GtidInterval {
                start,
                end: end - 1,
            });
        }
        Ok(GtidRange { sid, intervals })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gtid_set_bytes(ranges: &[(u128, &[(u64, u64)])]) -> Result<Bytes> {
        let mut out = BytesMut::new();
        out.write_le_u64(ranges.len() as u64)?;
        for (sid, intervals) in ranges {
            out.write_bytes(sid.to_le_bytes())?;
            out.write_le_u64(intervals.len() as u64)?;
            for (start, end) in intervals.iter() {
                out.write_le_u64(*start)?;
                out.write_le_u64(*end)?;
            }
        }
        Ok(out.freeze())
    }

    #[test]
    fn test_gtid_log_data() -> Result<()> {
        let data = GtidLogData {
            gtid_flags: 1,
            encoded_sid: 0x1234_5678,
            encoded_gno: 42,
            ts_type: 2,
            last_committed: 10,
            seq_num: 11,
        };
        let mut out = BytesMut::new();
        assert_eq!(42, data.clone().write_to(&mut out)?);
        assert_eq!(data, GtidLogData::read_from(&mut out.freeze())?);
        Ok(())
    }

    #[test]
    fn test_gtid_log_data_without_logical_ts() -> Result<()> {
        let mut out = BytesMut::new();
        out.write_u8(1)?;
        out.write_bytes(7u128.to_le_bytes())?;
        out.write_le_u64(3)?;
        let data = GtidLogData::read_from(&mut out.freeze())?;
        assert_eq!(3, data.encoded_gno);
        assert_eq!(0, data.last_committed);
        Ok(())
    }

    #[test]
    fn test_gtid_set() -> Result<()> {
        let payload = gtid_set_bytes(&[(1, &[(1, 5), (7, 9)][..]), (2, &[(1, 2)][..])])?;
        let data = PreviousGtidsLogData { payload };
        let set = data.gtid_set()?;
        assert_eq!(2, set.len());
        let range = set.get(1).expect("sid 1");
        assert_eq!(
            vec![
                GtidInterval { start: 1, end: 4 },
                GtidInterval { start: 7, end: 8 }
            ],
            range.intervals
        );
        let sids: Vec<u128> = set.ranges().map(|r| r.sid).collect();
        assert_eq!(vec![1, 2], sids);
        Ok(())
    }

    #[test]
    fn test_gtid_set_invalid() -> Result<()> {
        let payload = gtid_set_bytes(&[(1, &[(5, 5)][..])])?;
        assert!(GtidSet::read_from(&mut payload.clone()).is_err());
        let payload = gtid_set_bytes(&[(1, &[(1, 2)][..]), (1, &[(3, 4)][..])])?;
        assert!(GtidSet::read_from(&mut payload.clone()).is_err());
        Ok(())
    }
}

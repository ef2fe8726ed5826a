//! meaningful data structures and parsing logic of QueryEvent
use bitflags::bitflags;
use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};

/// Data of QueryEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/query-event.html
/// only support binlog v4 (with status_vars_length at end of post header)
#[derive(Debug, Clone, PartialEq)]
pub struct QueryData {
    pub slave_proxy_id: u32,
    pub exec_time: u32,
    pub schema_len: u8,
    pub error_code: u16,
    // if binlog version >= 4
    pub status_vars_len: u16,
    // below is variable part
    pub status_vars: Bytes,
    pub schema: Bytes,
    pub query: Bytes,
}

impl QueryData {
    /// query without status vars
    pub fn new(schema: impl Into<Bytes>, query: impl Into<Bytes>) -> Self {
        let schema = schema.into();
        QueryData {
            slave_proxy_id: 0,
            exec_time: 0,
            schema_len: schema.len() as u8,
            error_code: 0,
            status_vars_len: 0,
            status_vars: Bytes::new(),
            schema,
            query: query.into(),
        }
    }

    pub fn status_vars(&self) -> Result<QueryStatusVars> {
        QueryStatusVars::read_from(&mut self.status_vars.clone())
    }
}

impl ReadFromBytes for QueryData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let slave_proxy_id = input.read_le_u32()?;
        let exec_time = input.read_le_u32()?;
        let schema_len = input.read_u8()?;
        let error_code = input.read_le_u16()?;
        let status_vars_len = input.read_le_u16()?;
        // 13(4+4+1+2+2) bytes consumed
        // do not parse status_vars in this stage
        let status_vars = input.read_len(status_vars_len as usize)?;
        let schema = input.read_len(schema_len as usize)?;
        input.read_len(1)?;
        let query = input.split_to(input.remaining());
        Ok(QueryData {
            slave_proxy_id,
            exec_time,
            schema_len,
            error_code,
            status_vars_len,
            status_vars,
            schema,
            query,
        })
    }
}

impl WriteToBytes for QueryData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        if self.schema.len() != self.schema_len as usize
            || self.status_vars.len() != self.status_vars_len as usize
        {
            return Err(Error::ConstraintError(format!(
                "inconsistent query lengths: schema_len={}, status_vars_len={}",
                self.schema_len, self.status_vars_len
            )));
        }
        let mut len = 0;
        len += out.write_le_u32(self.slave_proxy_id)?;
        len += out.write_le_u32(self.exec_time)?;
        len += out.write_u8(self.schema_len)?;
        len += out.write_le_u16(self.error_code)?;
        len += out.write_le_u16(self.status_vars_len)?;
        len += out.write_bytes(self.status_vars)?;
        len += out.write_bytes(self.schema)?;
        len += out.write_u8(0)?;
        len += out.write_bytes(self.query)?;
        Ok(len)
    }
}

/// One entry of the status block.
///
/// Only the keys callers inspect are decoded, every other key
/// known to mysql 8.0 keeps its value undecoded.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStatusVar {
    Flags2(Flags2Code),
    SqlMode(u64),
    Charset { client: u16, conn: u16, server: u16 },
    UpdatedDbNames(Vec<Bytes>),
    Other { key: u8, value: Bytes },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStatusVars(Vec<QueryStatusVar>);

impl std::ops::Deref for QueryStatusVars {
    type Target = Vec<QueryStatusVar>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// value layout of keys kept undecoded
enum ValueLayout {
    Fixed(usize),
    // count of length-prefixed strings, then whether a '\0' follows
    Prefixed(usize, bool),
}

fn value_layout(key: u8) -> Option<ValueLayout> {
    use ValueLayout::*;
    let layout = match key {
        0x02 => Prefixed(1, true),
        0x03 => Fixed(4),
        0x05 | 0x06 => Prefixed(1, false),
        0x07 | 0x08 | 0x10 => Fixed(2),
        0x09 | 0x0f => Fixed(8),
        0x0a => Fixed(4),
        0x0b => Prefixed(2, false),
        0x0d => Fixed(3),
        0x0e | 0x11 | 0x12 => Fixed(1),
        _ => return None,
    };
    Some(layout)
}

fn read_value(input: &mut Bytes, layout: ValueLayout) -> Result<Bytes> {
    match layout {
        ValueLayout::Fixed(n) => input.read_len(n),
        ValueLayout::Prefixed(parts, terminated) => {
            let mut rest = input.clone();
            for _ in 0..parts {
                let n = rest.read_u8()?;
                rest.read_len(n as usize)?;
            }
            if terminated {
                rest.read_len(1)?;
            }
            input.read_len(input.len() - rest.len())
        }
    }
}

impl ReadFromBytes for QueryStatusVars {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let mut vars = Vec::new();
        while input.has_remaining() {
            let key = input.read_u8()?;
            let var = match key {
                0x00 => {
                    let flags = input.read_le_u32()?;
                    QueryStatusVar::Flags2(Flags2Code::from_bits_truncate(flags))
                }
                0x01 => QueryStatusVar::SqlMode(input.read_le_u64()?),
                0x04 => QueryStatusVar::Charset {
                    client: input.read_le_u16()?,
                    conn: input.read_le_u16()?,
                    server: input.read_le_u16()?,
                },
                0x0c => {
                    let cnt = input.read_u8()?;
                    let names = (0..cnt)
                        .map(|_| input.read_until(0, false))
                        .collect::<Result<Vec<_>>>()?;
                    QueryStatusVar::UpdatedDbNames(names)
                }
                _ => match value_layout(key) {
                    Some(layout) => QueryStatusVar::Other {
                        key,
                        value: read_value(input, layout)?,
                    },
                    None => {
                        return Err(Error::ConstraintError(format!(
                            "invalid key of query status var: {}",
                            key
                        )))
                    }
                },
            };
            vars.push(var);
        }
        Ok(QueryStatusVars(vars))
    }
}

bitflags! {
    pub struct Flags2Code: u32 {
        const AUTO_IS_NULL      = 0x0000_4000;
        const NOT_AUTOCOMMIT    = 0x0008_0000;
        const NO_FOREIGN_KEY_CHECKS = 0x0400_0000;
        const RELAXED_UNIQUE_CHECKS = 0x0800_0000;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_data() -> Result<()> {
        let data = QueryData::new("db1", "insert into t1 values (1)");
        let mut out = BytesMut::new();
        let len = data.clone().write_to(&mut out)?;
        assert_eq!(13 + 3 + 1 + 25, len);
        let parsed = QueryData::read_from(&mut out.freeze())?;
        assert_eq!(data, parsed);
        assert!(parsed.status_vars()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_query_status_vars() -> Result<()> {
        let mut out = BytesMut::new();
        out.write_u8(0x00)?;
        out.write_le_u32(Flags2Code::NOT_AUTOCOMMIT.bits())?;
        out.write_u8(0x04)?;
        out.write_le_u16(33)?;
        out.write_le_u16(33)?;
        out.write_le_u16(8)?;
        out.write_u8(0x0c)?;
        out.write_u8(2)?;
        out.write_bytes(b"db1\0db2\0")?;
        let vars = QueryStatusVars::read_from(&mut out.freeze())?;
        assert_eq!(3, vars.len());
        assert_eq!(QueryStatusVar::Flags2(Flags2Code::NOT_AUTOCOMMIT), vars[0]);
        assert_eq!(
            QueryStatusVar::Charset {
                client: 33,
                conn: 33,
                server: 8
            },
            vars[1]
        );
        assert_eq!(
            QueryStatusVar::UpdatedDbNames(vec![
                Bytes::from_static(b"db1"),
                Bytes::from_static(b"db2")
            ]),
            vars[2]
        );
        Ok(())
    }

    #[test]
    fn test_query_status_vars_undecoded() -> Result<()> {
        let mut out = BytesMut::new();
        // catalog
        out.write_u8(0x02)?;
        out.write_u8(3)?;
        out.write_bytes(b"std\0")?;
        // invoker
        out.write_u8(0x0b)?;
        out.write_u8(4)?;
        out.write_bytes(b"root")?;
        out.write_u8(9)?;
        out.write_bytes(b"localhost")?;
        // microseconds
        out.write_u8(0x0d)?;
        out.write_le_u24(500)?;
        out.write_u8(0x01)?;
        out.write_le_u64(0x0020_0000)?;
        let vars = QueryStatusVars::read_from(&mut out.freeze())?;
        assert_eq!(
            vec![
                QueryStatusVar::Other {
                    key: 0x02,
                    value: Bytes::from_static(b"\x03std\0")
                },
                QueryStatusVar::Other {
                    key: 0x0b,
                    value: Bytes::from_static(b"\x04root\x09localhost")
                },
                QueryStatusVar::Other {
                    key: 0x0d,
                    value: Bytes::from_static(&[0xf4, 0x01, 0x00])
                },
                QueryStatusVar::SqlMode(0x0020_0000),
            ],
            *vars
        );
        Ok(())
    }

    #[test]
    fn test_query_status_vars_truncated_value() {
        // invoker with hostname length past the end
        let mut input = Bytes::from_static(b"\x0b\x01a\x05ho");
        assert!(QueryStatusVars::read_from(&mut input).is_err());
        assert_eq!(5, input.len());
    }

    #[test]
    fn test_query_status_vars_invalid_key() {
        let mut input = Bytes::from_static(&[0x7f, 0, 0]);
        assert!(QueryStatusVars::read_from(&mut input).is_err());
    }
}

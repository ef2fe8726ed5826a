use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::my::{LenEncInt, ReadMyEnc};
use bytes_parser::{ReadBytesExt, ReadFromBytes, WriteBytesExt, WriteToBytes};
use smol_str::SmolStr;
use std::convert::TryFrom;

/// Data of TableMapEvent
///
/// reference: https://dev.mysql.com/doc/internals/en/table-map-event.html
/// only support binlog v4
#[derive(Debug, Clone, PartialEq)]
pub struct TableMapData {
    // actually 6-bytes integer
    pub table_id: u64,
    pub flags: u16,
    // below is variable part
    // complicated to decode, so leave it as is
    // use specific function to evaluate later
    pub payload: Bytes,
}

impl ReadFromBytes for TableMapData {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let table_id = input.read_le_u48()?;
        let flags = input.read_le_u16()?;
        let payload = input.split_to(input.remaining());
        Ok(TableMapData {
            table_id,
            flags,
            payload,
        })
    }
}

impl WriteToBytes for TableMapData {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_le_u48(self.table_id)?;
        len += out.write_le_u16(self.flags)?;
        len += out.write_bytes(self.payload)?;
        Ok(len)
    }
}

impl TableMapData {
    pub fn table_map(&self) -> crate::error::Result<TableMap> {
        // make copy of payload
        let mut payload = self.payload.clone();
        let rtm = RawTableMap::read_from(&mut payload)?;
        TableMap::from_raw(rtm)
    }
}

#[derive(Debug, Clone)]
struct RawTableMap {
    schema_name: Bytes,
    table_name: Bytes,
    col_cnt: u64,
    col_defs: Bytes,
    col_meta_defs: Bytes,
    null_bitmap: Bytes,
}

/// reference: https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/rows_event.h
impl ReadFromBytes for RawTableMap {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let schema_name_len = input.read_u8()?;
        let schema_name = input.read_len(schema_name_len as usize)?;
        input.read_len(1)?;
        let table_name_len = input.read_u8()?;
        let table_name = input.read_len(table_name_len as usize)?;
        input.read_len(1)?;
        let col_cnt = input.read_packed_u64()?;
        let col_defs = input.read_len(col_cnt as usize)?;
        let col_meta_defs_len = input.read_len_enc_int()?;
        let col_meta_defs_len = col_meta_defs_len
            .to_u64()
            .ok_or_else(|| Error::ConstraintError("error column meta def length".to_owned()))?;
        let col_meta_defs = input.read_len(col_meta_defs_len as usize)?;
        let bitmap_len = (col_cnt + 7) / 8u64;
        let null_bitmap = input.read_len(bitmap_len as usize)?;
        // optional metadata of 8.0 is not parsed
        Ok(RawTableMap {
            schema_name,
            table_name,
            col_cnt,
            col_defs,
            col_meta_defs,
            null_bitmap,
        })
    }
}

/// table definition carried by TableMapEvent
///
/// column metadata is kept raw, its layout depends on column types
#[derive(Debug, Clone, PartialEq)]
pub struct TableMap {
    pub schema_name: SmolStr,
    pub table_name: SmolStr,
    pub col_types: Vec<u8>,
    pub col_meta_defs: Bytes,
    pub null_bitmap: Bytes,
}

impl TableMap {
    pub fn col_cnt(&self) -> usize {
        self.col_types.len()
    }

    /// whether column at given index is nullable
    pub fn nullable(&self, idx: usize) -> bool {
        self.null_bitmap
            .get(idx >> 3)
            .map(|b| b & (1 << (idx & 7)) != 0)
            .unwrap_or(false)
    }

    /// encode as TableMapData payload
    pub fn to_payload(&self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        for name in &[&self.schema_name, &self.table_name] {
            let name = name.as_bytes();
            let name_len = u8::try_from(name.len())
                .map_err(|_| Error::ConstraintError(format!("name too long: {}", name.len())))?;
            out.write_u8(name_len)?;
            out.write_bytes(name)?;
            out.write_u8(0)?;
        }
        LenEncInt::from(self.col_types.len() as u64).write_to(&mut out)?;
        out.write_bytes(&self.col_types)?;
        LenEncInt::from(self.col_meta_defs.len() as u64).write_to(&mut out)?;
        out.write_bytes(&self.col_meta_defs)?;
        out.write_bytes(&self.null_bitmap)?;
        Ok(out.freeze())
    }
}

impl TableMap {
    fn from_raw(raw: RawTableMap) -> crate::error::Result<Self> {
        let schema_name = SmolStr::from(String::from_utf8(raw.schema_name.to_vec())?);
        let table_name = SmolStr::from(String::from_utf8(raw.table_name.to_vec())?);
        debug_assert_eq!(raw.col_cnt as usize, raw.col_defs.len());
        Ok(TableMap {
            schema_name,
            table_name,
            col_types: raw.col_defs.to_vec(),
            col_meta_defs: raw.col_meta_defs,
            null_bitmap: raw.null_bitmap,
        })
    }
}

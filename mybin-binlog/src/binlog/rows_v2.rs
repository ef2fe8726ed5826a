//! meaningful data structures and parsing logic of RowsEventV2
use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::my::ReadMyEnc;
use bytes_parser::{
    ReadBytesExt, ReadFromBytes, ReadFromBytesWithContext, WriteBytesExt, WriteToBytes,
};

/// Data of DeleteRowEventV2, UpdateRowsEventV2, WriteRowsEventV2
///
/// reference: https://dev.mysql.com/doc/internals/en/rows-event.html
/// detailed row information will be handled by separate module
#[derive(Debug, Clone, PartialEq)]
pub struct RowsDataV2 {
    // actual 6-byte integer
    pub table_id: u64,
    pub flags: u16,
    // includes the 2 bytes of itself
    pub extra_data_len: u16,
    // below is variable part
    pub payload: Bytes,
}

impl RowsDataV2 {
    pub fn raw_delete_rows(&self) -> Result<RawRowsV2> {
        self.raw_rows(false)
    }

    pub fn raw_write_rows(&self) -> Result<RawRowsV2> {
        self.raw_rows(false)
    }

    pub fn raw_update_rows(&self) -> Result<RawRowsV2> {
        self.raw_rows(true)
    }

    fn raw_rows(&self, update: bool) -> Result<RawRowsV2> {
        let extra_data_len = self.extra_data_len.checked_sub(2).ok_or_else(|| {
            Error::ConstraintError(format!("invalid extra data length: {}", self.extra_data_len))
        })?;
        RawRowsV2::read_with_ctx(&mut self.payload.clone(), (extra_data_len, update))
    }
}

impl ReadFromBytes for RowsDataV2 {
    fn read_from(input: &mut Bytes) -> Result<Self> {
        let table_id = input.read_le_u48()?;
        let flags = input.read_le_u16()?;
        let extra_data_len = input.read_le_u16()?;
        let payload = input.split_to(input.remaining());
        Ok(RowsDataV2 {
            table_id,
            flags,
            extra_data_len,
            payload,
        })
    }
}

impl WriteToBytes for RowsDataV2 {
    fn write_to(self, out: &mut BytesMut) -> Result<usize> {
        let mut len = out.write_le_u48(self.table_id)?;
        len += out.write_le_u16(self.flags)?;
        len += out.write_le_u16(self.extra_data_len)?;
        len += out.write_bytes(self.payload)?;
        Ok(len)
    }
}

/// raw rows v2, including WriteRows, UpdateRows and DeleteRows v2
///
/// row images are kept as is, they can only be decoded
/// with column metadata from the table map
#[derive(Debug, Clone, PartialEq)]
pub struct RawRowsV2 {
    pub extra_data: Bytes,
    pub n_cols: u32,
    pub before_col_bitmap: Bytes,
    // only UpdateRowsEventV2 owns different bitmaps
    // of before and after
    pub after_col_bitmap: Bytes,
    pub rows_data: Bytes,
}

impl RawRowsV2 {
    /// whether column at given index is present in before image
    pub fn before_col_present(&self, idx: usize) -> bool {
        bitmap_get(&self.before_col_bitmap, idx)
    }

    /// whether column at given index is present in after image
    pub fn after_col_present(&self, idx: usize) -> bool {
        bitmap_get(&self.after_col_bitmap, idx)
    }
}

fn bitmap_get(bitmap: &[u8], idx: usize) -> bool {
    bitmap
        .get(idx >> 3)
        .map(|b| b & (1 << (idx & 7)) != 0)
        .unwrap_or(false)
}

/// the extra data length in context should be real length: len in binlog minus 2
impl ReadFromBytesWithContext<'_> for RawRowsV2 {
    type Context = (u16, bool);

    fn read_with_ctx(input: &mut Bytes, (extra_data_len, update): Self::Context) -> Result<Self> {
        let extra_data = input.read_len(extra_data_len as usize)?;
        let n_cols = input.read_packed_u32()?;
        let bitmap_len = ((n_cols as usize) + 7) >> 3;
        let before_col_bitmap = input.read_len(bitmap_len)?;
        let after_col_bitmap = if update {
            input.read_len(bitmap_len)?
        } else {
            before_col_bitmap.clone()
        };
        let rows_data = input.split_to(input.remaining());
        Ok(RawRowsV2 {
            extra_data,
            n_cols,
            before_col_bitmap,
            after_col_bitmap,
            rows_data,
        })
    }
}

pub mod compression;
pub mod deserializer;
pub mod fde;
pub mod gtid;
pub mod header;
pub mod incident;
pub mod intvar;
pub mod payload;
pub mod query;
pub mod rand;
pub mod reader;
pub mod rotate;
pub mod rows_query;
pub mod rows_v2;
pub mod table_map;
pub mod user_var;
mod util;
pub mod xid;

use crate::try_from_event;
use crate::util::checksum_crc32;
use bytes::{Bytes, BytesMut};
use bytes_parser::error::{Error, Result};
use bytes_parser::{WriteBytesExt, WriteToBytes, WriteToBytesWithContext};
use std::convert::TryFrom;

pub use compression::{CompressionType, Decompressor};
pub use deserializer::EventDeserializer;
pub use fde::FormatDescriptionData;
pub use gtid::{GtidLogData, GtidSet, PreviousGtidsLogData};
pub use header::{EventHeader, EventHeaderFlags, EVENT_HEADER_LEN};
pub use incident::IncidentData;
pub use intvar::IntvarData;
pub use payload::{PayloadEvents, PayloadHeader, TransactionPayloadData};
pub use query::QueryData;
pub use rand::RandData;
pub use reader::BinlogFileReader;
pub use rotate::{HeartbeatData, RotateData};
pub use rows_query::RowsQueryData;
pub use rows_v2::RowsDataV2;
pub use table_map::{TableMap, TableMapData};
pub use user_var::UserVarData;
pub use xid::XidData;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogEventType {
    Unknown,
    StartEventV3,
    QueryEvent,
    StopEvent,
    RotateEvent,
    IntvarEvent,
    LoadEvent,
    SlaveEvent,
    CreateFileEvent,
    AppendBlockEvent,
    ExecLoadEvent,
    DeleteFileEvent,
    NewLoadEvent,
    RandEvent,
    UserVarEvent,
    FormatDescriptionEvent,
    XidEvent,
    BeginLoadQueryEvent,
    ExecuteLoadQueryEvent,
    TableMapEvent,
    WriteRowsEventV0,
    UpdateRowsEventV0,
    DeleteRowsEventV0,
    WriteRowsEventV1,
    UpdateRowsEventV1,
    DeleteRowsEventV1,
    IncidentEvent,
    HeartbeatLogEvent,
    IgnorableLogEvent,
    RowsQueryLogEvent,
    WriteRowsEventV2,
    UpdateRowsEventV2,
    DeleteRowsEventV2,
    GtidLogEvent,
    AnonymousGtidLogEvent,
    PreviousGtidsLogEvent,
    TransactionContextEvent,
    ViewChangeEvent,
    XaPrepareLogEvent,
    PartialUpdateRowsEvent,
    TransactionPayloadEvent,
    HeartbeatLogEventV2,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogEventTypeCode(pub u8);

impl From<u8> for LogEventType {
    fn from(code: u8) -> LogEventType {
        match code {
            0 => LogEventType::Unknown,
            1 => LogEventType::StartEventV3,
            2 => LogEventType::QueryEvent,
            3 => LogEventType::StopEvent,
            4 => LogEventType::RotateEvent,
            5 => LogEventType::IntvarEvent,
            6 => LogEventType::LoadEvent,
            7 => LogEventType::SlaveEvent,
            8 => LogEventType::CreateFileEvent,
            9 => LogEventType::AppendBlockEvent,
            10 => LogEventType::ExecLoadEvent,
            11 => LogEventType::DeleteFileEvent,
            12 => LogEventType::NewLoadEvent,
            13 => LogEventType::RandEvent,
            14 => LogEventType::UserVarEvent,
            15 => LogEventType::FormatDescriptionEvent,
            16 => LogEventType::XidEvent,
            17 => LogEventType::BeginLoadQueryEvent,
            18 => LogEventType::ExecuteLoadQueryEvent,
            19 => LogEventType::TableMapEvent,
            // below three are also called PreGa(Write|Update|Delete)RowsEvent
            // used in 5.1.0 ~ 5.1.17
            20 => LogEventType::WriteRowsEventV0,
            21 => LogEventType::UpdateRowsEventV0,
            22 => LogEventType::DeleteRowsEventV0,
            // below three used in 5.1.18 ~ 5.6.x
            23 => LogEventType::WriteRowsEventV1,
            24 => LogEventType::UpdateRowsEventV1,
            25 => LogEventType::DeleteRowsEventV1,
            26 => LogEventType::IncidentEvent,
            27 => LogEventType::HeartbeatLogEvent,
            28 => LogEventType::IgnorableLogEvent,
            29 => LogEventType::RowsQueryLogEvent,
            // below three used after 5.6.x
            30 => LogEventType::WriteRowsEventV2,
            31 => LogEventType::UpdateRowsEventV2,
            32 => LogEventType::DeleteRowsEventV2,
            33 => LogEventType::GtidLogEvent,
            34 => LogEventType::AnonymousGtidLogEvent,
            35 => LogEventType::PreviousGtidsLogEvent,
            // below is from source code
            // https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/binlog_event.h
            36 => LogEventType::TransactionContextEvent,
            37 => LogEventType::ViewChangeEvent,
            38 => LogEventType::XaPrepareLogEvent,
            39 => LogEventType::PartialUpdateRowsEvent,
            // since 8.0.20
            40 => LogEventType::TransactionPayloadEvent,
            41 => LogEventType::HeartbeatLogEventV2,
            _ => LogEventType::Invalid,
        }
    }
}

impl From<LogEventTypeCode> for LogEventType {
    fn from(type_code: LogEventTypeCode) -> LogEventType {
        LogEventType::from(type_code.0)
    }
}

impl From<LogEventType> for LogEventTypeCode {
    fn from(event_type: LogEventType) -> LogEventTypeCode {
        match event_type {
            LogEventType::Unknown => LogEventTypeCode(0),
            LogEventType::StartEventV3 => LogEventTypeCode(1),
            LogEventType::QueryEvent => LogEventTypeCode(2),
            LogEventType::StopEvent => LogEventTypeCode(3),
            LogEventType::RotateEvent => LogEventTypeCode(4),
            LogEventType::IntvarEvent => LogEventTypeCode(5),
            LogEventType::LoadEvent => LogEventTypeCode(6),
            LogEventType::SlaveEvent => LogEventTypeCode(7),
            LogEventType::CreateFileEvent => LogEventTypeCode(8),
            LogEventType::AppendBlockEvent => LogEventTypeCode(9),
            LogEventType::ExecLoadEvent => LogEventTypeCode(10),
            LogEventType::DeleteFileEvent => LogEventTypeCode(11),
            LogEventType::NewLoadEvent => LogEventTypeCode(12),
            LogEventType::RandEvent => LogEventTypeCode(13),
            LogEventType::UserVarEvent => LogEventTypeCode(14),
            LogEventType::FormatDescriptionEvent => LogEventTypeCode(15),
            LogEventType::XidEvent => LogEventTypeCode(16),
            LogEventType::BeginLoadQueryEvent => LogEventTypeCode(17),
            LogEventType::ExecuteLoadQueryEvent => LogEventTypeCode(18),
            LogEventType::TableMapEvent => LogEventTypeCode(19),
            LogEventType::WriteRowsEventV0 => LogEventTypeCode(20),
            LogEventType::UpdateRowsEventV0 => LogEventTypeCode(21),
            LogEventType::DeleteRowsEventV0 => LogEventTypeCode(22),
            LogEventType::WriteRowsEventV1 => LogEventTypeCode(23),
            LogEventType::UpdateRowsEventV1 => LogEventTypeCode(24),
            LogEventType::DeleteRowsEventV1 => LogEventTypeCode(25),
            LogEventType::IncidentEvent => LogEventTypeCode(26),
            LogEventType::HeartbeatLogEvent => LogEventTypeCode(27),
            LogEventType::IgnorableLogEvent => LogEventTypeCode(28),
            LogEventType::RowsQueryLogEvent => LogEventTypeCode(29),
            LogEventType::WriteRowsEventV2 => LogEventTypeCode(30),
            LogEventType::UpdateRowsEventV2 => LogEventTypeCode(31),
            LogEventType::DeleteRowsEventV2 => LogEventTypeCode(32),
            LogEventType::GtidLogEvent => LogEventTypeCode(33),
            LogEventType::AnonymousGtidLogEvent => LogEventTypeCode(34),
            LogEventType::PreviousGtidsLogEvent => LogEventTypeCode(35),
            LogEventType::TransactionContextEvent => LogEventTypeCode(36),
            LogEventType::ViewChangeEvent => LogEventTypeCode(37),
            LogEventType::XaPrepareLogEvent => LogEventTypeCode(38),
            LogEventType::PartialUpdateRowsEvent => LogEventTypeCode(39),
            LogEventType::TransactionPayloadEvent => LogEventTypeCode(40),
            LogEventType::HeartbeatLogEventV2 => LogEventTypeCode(41),
            // pseudo invalid code
            LogEventType::Invalid => LogEventTypeCode(99),
        }
    }
}

/// v4 event with common header, data and checksum
///
/// crc32 is 0 if checksum is disabled
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent<D> {
    pub header: EventHeader,
    pub data: D,
    pub crc32: u32,
}

impl<D> RawEvent<D> {
    pub fn new(header: EventHeader, data: D) -> Self {
        RawEvent {
            header,
            data,
            crc32: 0,
        }
    }
}

/// writes header, data and optional checksum,
/// event length in header is calculated from data
impl<D: WriteToBytes> WriteToBytesWithContext<'_> for RawEvent<D> {
    // whether to append crc32 checksum
    type Context = bool;

    fn write_with_ctx(self, out: &mut BytesMut, checksum: bool) -> Result<usize> {
        let mut data = BytesMut::new();
        self.data.write_to(&mut data)?;
        let checksum_len = if checksum { 4 } else { 0 };
        let event_len = EVENT_HEADER_LEN + data.len() + checksum_len;
        let mut header = self.header;
        header.event_len = u32::try_from(event_len)
            .map_err(|_| Error::ConstraintError(format!("event too large: {}", event_len)))?;
        let start = out.len();
        let mut len = header.write_to(out)?;
        len += out.write_bytes(data)?;
        if checksum {
            let crc32 = checksum_crc32(&out[start..]);
            len += out.write_le_u32(crc32)?;
        }
        Ok(len)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    // 2
    QueryEvent(RawEvent<QueryData>),
    // 3
    StopEvent(RawEvent<()>),
    // 4
    RotateEvent(RawEvent<RotateData>),
    // 5
    IntvarEvent(RawEvent<IntvarData>),
    // 13
    RandEvent(RawEvent<RandData>),
    // 14
    UserVarEvent(RawEvent<UserVarData>),
    // 15
    FormatDescriptionEvent(RawEvent<FormatDescriptionData>),
    // 16
    XidEvent(RawEvent<XidData>),
    // 19
    TableMapEvent(RawEvent<TableMapData>),
    // 26
    IncidentEvent(RawEvent<IncidentData>),
    // 27
    HeartbeatLogEvent(RawEvent<HeartbeatData>),
    // 29
    RowsQueryLogEvent(RawEvent<RowsQueryData>),
    // 30
    WriteRowsEventV2(RawEvent<RowsDataV2>),
    // 31
    UpdateRowsEventV2(RawEvent<RowsDataV2>),
    // 32
    DeleteRowsEventV2(RawEvent<RowsDataV2>),
    // 33
    GtidLogEvent(RawEvent<GtidLogData>),
    // 34
    AnonymousGtidLogEvent(RawEvent<GtidLogData>),
    // 35
    PreviousGtidsLogEvent(RawEvent<PreviousGtidsLogData>),
    // 40
    TransactionPayloadEvent(RawEvent<TransactionPayloadData>),
    // any other type, data kept as is
    Unknown(RawEvent<Bytes>),
}

macro_rules! each_event {
    ($event:expr, $e:ident => $body:expr) => {
        match $event {
            Event::QueryEvent($e) => $body,
            Event::StopEvent($e) => $body,
            Event::RotateEvent($e) => $body,
            Event::IntvarEvent($e) => $body,
            Event::RandEvent($e) => $body,
            Event::UserVarEvent($e) => $body,
            Event::FormatDescriptionEvent($e) => $body,
            Event::XidEvent($e) => $body,
            Event::TableMapEvent($e) => $body,
            Event::IncidentEvent($e) => $body,
            Event::HeartbeatLogEvent($e) => $body,
            Event::RowsQueryLogEvent($e) => $body,
            Event::WriteRowsEventV2($e) => $body,
            Event::UpdateRowsEventV2($e) => $body,
            Event::DeleteRowsEventV2($e) => $body,
            Event::GtidLogEvent($e) => $body,
            Event::AnonymousGtidLogEvent($e) => $body,
            Event::PreviousGtidsLogEvent($e) => $body,
            Event::TransactionPayloadEvent($e) => $body,
            Event::Unknown($e) => $body,
        }
    };
}

impl Event {
    pub fn header(&self) -> &EventHeader {
        each_event!(self, e => &e.header)
    }

    /// type from header, so unknown events keep their original type
    pub fn event_type(&self) -> LogEventType {
        self.header().event_type()
    }

    pub fn crc32(&self) -> u32 {
        each_event!(self, e => e.crc32)
    }
}

try_from_event!(QueryData, QueryEvent);
try_from_event!((), StopEvent);
try_from_event!(RotateData, RotateEvent);
try_from_event!(IntvarData, IntvarEvent);
try_from_event!(RandData, RandEvent);
try_from_event!(UserVarData, UserVarEvent);
try_from_event!(FormatDescriptionData, FormatDescriptionEvent);
try_from_event!(XidData, XidEvent);
try_from_event!(TableMapData, TableMapEvent);
try_from_event!(IncidentData, IncidentEvent);
try_from_event!(HeartbeatData, HeartbeatLogEvent);
try_from_event!(RowsQueryData, RowsQueryLogEvent);
try_from_event!(
    RowsDataV2,
    WriteRowsEventV2,
    UpdateRowsEventV2,
    DeleteRowsEventV2
);
try_from_event!(GtidLogData, GtidLogEvent, AnonymousGtidLogEvent);
try_from_event!(PreviousGtidsLogData, PreviousGtidsLogEvent);
try_from_event!(TransactionPayloadData, TransactionPayloadEvent);
try_from_event!(Bytes, Unknown);

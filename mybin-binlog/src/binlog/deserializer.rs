//! stream based event deserializer
use super::*;
use crate::error::{Error, Result};
use crate::opts::DeserializerOpts;
use crate::util::{checksum_crc32, read_full};
use bytes::Bytes;
use bytes_parser::error::Needed;
use bytes_parser::{ReadBytesExt, ReadFromBytes};
use std::io::Read;

const CHECKSUM_LEN: usize = 4;

/// initial capacity of event buffer, larger events grow it while reading
const INIT_EVENT_BUF_LEN: usize = 64 * 1024;

/// deserializes v4 events one by one from a byte stream
///
/// the checksum option follows the latest format description event.
#[derive(Debug, Clone, Default)]
pub struct EventDeserializer {
    opts: DeserializerOpts,
}

impl EventDeserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_opts(opts: DeserializerOpts) -> Self {
        EventDeserializer { opts }
    }

    pub fn opts(&self) -> &DeserializerOpts {
        &self.opts
    }

    /// whether events currently end with crc32 checksum
    pub fn checksum(&self) -> bool {
        self.opts.checksum
    }

    /// read next event from source
    ///
    /// returns None if source is exhausted exactly at event boundary,
    /// a partial event is an incomplete input error.
    pub fn next_event<R: Read>(&mut self, source: &mut R) -> Result<Option<Event>> {
        let mut header_buf = [0u8; EVENT_HEADER_LEN];
        let n = read_full(source, &mut header_buf)?;
        if n == 0 {
            return Ok(None);
        }
        if n < EVENT_HEADER_LEN {
            return Err(bytes_parser::Error::InputIncomplete(
                Bytes::copy_from_slice(&header_buf[..n]),
                Needed::Size(EVENT_HEADER_LEN - n),
            )
            .into());
        }
        let header = EventHeader::read_from(&mut Bytes::copy_from_slice(&header_buf))?;
        self.check_event_len(&header)?;
        let event_len = header.event_len as usize;
        let body_len = event_len - EVENT_HEADER_LEN;
        let mut buf = Vec::with_capacity(event_len.min(INIT_EVENT_BUF_LEN));
        buf.extend_from_slice(&header_buf);
        let n = source.by_ref().take(body_len as u64).read_to_end(&mut buf)?;
        if n < body_len {
            return Err(bytes_parser::Error::InputIncomplete(
                Bytes::from(buf),
                Needed::Size(body_len - n),
            )
            .into());
        }
        self.decode_event(header, Bytes::from(buf)).map(Some)
    }

    /// parse event from its complete bytes, common header included
    pub fn parse_event(&mut self, raw: Bytes) -> Result<Event> {
        let header = EventHeader::read_from(&mut raw.clone())?;
        self.check_event_len(&header)?;
        if raw.len() != header.event_len as usize {
            return Err(Error::InvalidBinlogFormat(format!(
                "event length mismatch: header={}, actual={}",
                header.event_len,
                raw.len()
            )));
        }
        self.decode_event(header, raw)
    }

    fn check_event_len(&self, header: &EventHeader) -> Result<()> {
        let min_len = if self.opts.checksum {
            EVENT_HEADER_LEN + CHECKSUM_LEN
        } else {
            EVENT_HEADER_LEN
        };
        if (header.event_len as usize) < min_len {
            return Err(Error::InvalidBinlogFormat(format!(
                "event length {} less than {}",
                header.event_len, min_len
            )));
        }
        Ok(())
    }

    fn decode_event(&mut self, header: EventHeader, raw: Bytes) -> Result<Event> {
        log::trace!(
            "event header: type={:?}, server_id={}, event_len={}, next_pos={}",
            header.event_type(),
            header.server_id,
            header.event_len,
            header.next_pos
        );
        if header.event_type() == LogEventType::FormatDescriptionEvent {
            return self.decode_fde(header, raw);
        }
        let (mut data, crc32) = if self.opts.checksum {
            let crc_pos = raw.len() - CHECKSUM_LEN;
            let crc32 = self.verify_checksum(&raw, crc_pos)?;
            (raw.slice(EVENT_HEADER_LEN..crc_pos), crc32)
        } else {
            (raw.slice(EVENT_HEADER_LEN..), 0)
        };
        let event = match header.event_type() {
            LogEventType::QueryEvent => Event::QueryEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::StopEvent => Event::StopEvent(RawEvent {
                header,
                data: (),
                crc32,
            }),
            LogEventType::RotateEvent => Event::RotateEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::IntvarEvent => Event::IntvarEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::RandEvent => Event::RandEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::UserVarEvent => Event::UserVarEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::XidEvent => Event::XidEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::TableMapEvent => Event::TableMapEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::IncidentEvent => Event::IncidentEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::HeartbeatLogEvent => {
                Event::HeartbeatLogEvent(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::RowsQueryLogEvent => {
                Event::RowsQueryLogEvent(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::WriteRowsEventV2 => {
                Event::WriteRowsEventV2(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::UpdateRowsEventV2 => {
                Event::UpdateRowsEventV2(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::DeleteRowsEventV2 => {
                Event::DeleteRowsEventV2(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::GtidLogEvent => Event::GtidLogEvent(raw_event(header, &mut data, crc32)?),
            LogEventType::AnonymousGtidLogEvent => {
                Event::AnonymousGtidLogEvent(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::PreviousGtidsLogEvent => {
                Event::PreviousGtidsLogEvent(raw_event(header, &mut data, crc32)?)
            }
            LogEventType::TransactionPayloadEvent => {
                let data = TransactionPayloadData::decode(&mut data)?;
                Event::TransactionPayloadEvent(RawEvent {
                    header,
                    data,
                    crc32,
                })
            }
            other => {
                log::trace!("keep raw data of {:?}", other);
                Event::Unknown(RawEvent {
                    header,
                    data,
                    crc32,
                })
            }
        };
        Ok(event)
    }

    /// FDE always ends with checksum if its own flag says so,
    /// and switches the checksum of all following events
    fn decode_fde(&mut self, header: EventHeader, raw: Bytes) -> Result<Event> {
        let mut input = raw.slice(EVENT_HEADER_LEN..);
        let data = FormatDescriptionData::read_from(&mut input)?;
        let checksum = data.checksum_enabled();
        let crc32 = if checksum {
            if input.len() < CHECKSUM_LEN {
                return Err(Error::InvalidBinlogFormat(
                    "missing checksum of format description event".to_owned(),
                ));
            }
            self.verify_checksum(&raw, raw.len() - CHECKSUM_LEN)?
        } else {
            0
        };
        log::debug!(
            "format description: server_version={}, checksum={}",
            data.server_version,
            checksum
        );
        self.opts.checksum = checksum;
        Ok(Event::FormatDescriptionEvent(RawEvent {
            header,
            data,
            crc32,
        }))
    }

    /// returns the checksum stored at given position
    fn verify_checksum(&self, raw: &Bytes, crc_pos: usize) -> Result<u32> {
        let expected = raw.slice(crc_pos..).read_le_u32()?;
        if self.opts.validate_checksum {
            let actual = checksum_crc32(&raw[..crc_pos]);
            if expected != actual {
                return Err(Error::BinlogChecksumMismatch(expected, actual));
            }
        }
        Ok(expected)
    }
}

fn raw_event<D: ReadFromBytes>(header: EventHeader, input: &mut Bytes, crc32: u32) -> Result<RawEvent<D>> {
    let data = D::read_from(input)?;
    Ok(RawEvent {
        header,
        data,
        crc32,
    })
}

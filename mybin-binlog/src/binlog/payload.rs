//! transaction payload event, a whole transaction of events
//! packed into one event and usually compressed
//!
//! reference: https://github.com/mysql/mysql-server/blob/8.0/libbinlogevents/include/control_events.h
use super::compression::{CompressionType, Decompressor, COMPRESSION_ZSTD};
use super::deserializer::EventDeserializer;
use super::Event;
use crate::error::{Error, Result};
use crate::opts::DeserializerOpts;
use bytes::{Buf, Bytes, BytesMut};
use bytes_parser::my::{LenEncInt, ReadMyEnc};
use bytes_parser::{WriteBytesExt, WriteToBytes};

const FIELD_END: u32 = 0;
const FIELD_PAYLOAD_SIZE: u32 = 1;
const FIELD_COMPRESSION_TYPE: u32 = 2;
const FIELD_UNCOMPRESSED_SIZE: u32 = 3;

/// payload must fit in one buffer addressable by a signed 32-bit length
pub const MAX_PAYLOAD_SIZE: u32 = i32::MAX as u32;

/// tagged field of payload header: type, length, value,
/// all encoded as packed integers
#[derive(Debug, Clone, PartialEq)]
enum HeaderField {
    End,
    PayloadSize(u32),
    CompressionType(u32),
    UncompressedSize(u64),
    // value is skipped
    Unknown { field_type: u32, field_len: u32 },
}

impl HeaderField {
    /// returns None if input runs out before type or length of the field
    fn read_from(input: &mut Bytes) -> Result<Option<HeaderField>> {
        let field_type = match read_tag(input)? {
            Some(field_type) => field_type,
            None => return Ok(None),
        };
        if field_type == FIELD_END {
            return Ok(Some(HeaderField::End));
        }
        let field_len = match read_tag(input)? {
            Some(field_len) => field_len,
            None => return Ok(None),
        };
        // recognized values are self-delimiting, field_len is not needed
        let field = match field_type {
            FIELD_PAYLOAD_SIZE => HeaderField::PayloadSize(
                input
                    .read_packed_u32()
                    .map_err(|e| value_error(field_type, e))?,
            ),
            FIELD_COMPRESSION_TYPE => HeaderField::CompressionType(
                input
                    .read_packed_u32()
                    .map_err(|e| value_error(field_type, e))?,
            ),
            FIELD_UNCOMPRESSED_SIZE => HeaderField::UncompressedSize(
                input
                    .read_packed_u64()
                    .map_err(|e| value_error(field_type, e))?,
            ),
            _ => {
                if input.remaining() < field_len as usize {
                    return Err(Error::TruncatedHeader(format!(
                        "unknown field {} declares {} bytes but {} remain",
                        field_type,
                        field_len,
                        input.remaining()
                    )));
                }
                input.advance(field_len as usize);
                HeaderField::Unknown {
                    field_type,
                    field_len,
                }
            }
        };
        Ok(Some(field))
    }
}

/// read type or length of a field, returns None if input is exhausted
fn read_tag(input: &mut Bytes) -> Result<Option<u32>> {
    match input.read_packed_u32() {
        Ok(n) => Ok(Some(n)),
        Err(bytes_parser::Error::InputIncomplete(..)) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn value_error(field_type: u32, e: bytes_parser::Error) -> Error {
    match e {
        bytes_parser::Error::InputIncomplete(_, needed) => Error::TruncatedHeader(format!(
            "value of field {} incomplete: needed={:?}",
            field_type, needed
        )),
        other => other.into(),
    }
}

/// parsed header of transaction payload event
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadHeader {
    pub payload_size: u32,
    pub compression_type: u32,
    pub uncompressed_size: u64,
}

impl PayloadHeader {
    /// read fields until the end mark or the end of input
    ///
    /// an absent compression type stays zstd, an absent
    /// uncompressed size equals the payload size.
    pub fn read_from(input: &mut Bytes) -> Result<Self> {
        let mut payload_size = 0;
        let mut compression_type = COMPRESSION_ZSTD;
        let mut uncompressed_size = None;
        while let Some(field) = HeaderField::read_from(input)? {
            match field {
                HeaderField::End => break,
                HeaderField::PayloadSize(n) => payload_size = n,
                HeaderField::CompressionType(ct) => compression_type = ct,
                HeaderField::UncompressedSize(n) => uncompressed_size = Some(n),
                HeaderField::Unknown {
                    field_type,
                    field_len,
                } => log::trace!(
                    "skip payload header field: type={}, len={}",
                    field_type,
                    field_len
                ),
            }
        }
        Ok(PayloadHeader {
            payload_size,
            compression_type,
            uncompressed_size: uncompressed_size.unwrap_or(payload_size as u64),
        })
    }

    pub fn compression(&self) -> CompressionType {
        CompressionType::from(self.compression_type)
    }
}

/// writes payload size, compression type, uncompressed size and end mark,
/// the length of each field is the width of its encoded value
impl WriteToBytes for PayloadHeader {
    fn write_to(self, out: &mut BytesMut) -> bytes_parser::Result<usize> {
        let mut len = 0;
        len += write_field(out, FIELD_PAYLOAD_SIZE, LenEncInt::from(self.payload_size))?;
        len += write_field(
            out,
            FIELD_COMPRESSION_TYPE,
            LenEncInt::from(self.compression_type),
        )?;
        len += write_field(
            out,
            FIELD_UNCOMPRESSED_SIZE,
            LenEncInt::from(self.uncompressed_size),
        )?;
        len += LenEncInt::from(FIELD_END).write_to(out)?;
        Ok(len)
    }
}

fn write_field(out: &mut BytesMut, field_type: u32, value: LenEncInt) -> bytes_parser::Result<usize> {
    let mut len = LenEncInt::from(field_type).write_to(out)?;
    len += LenEncInt::from(value.encoded_len() as u64).write_to(out)?;
    len += value.write_to(out)?;
    Ok(len)
}

/// Data of TransactionPayloadEvent
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPayloadData {
    pub payload_size: u32,
    pub compression_type: u32,
    pub uncompressed_size: u64,
    pub payload: Bytes,
    pub uncompressed_events: Vec<Event>,
}

impl TransactionPayloadData {
    /// decode header, payload and all embedded events
    ///
    /// any failure aborts the whole decoding, no partial event
    /// list is returned.
    pub fn decode(input: &mut Bytes) -> Result<Self> {
        let header = PayloadHeader::read_from(input)?;
        let payload = read_payload(input, header.payload_size)?;
        let uncompressed_events = PayloadEvents::new(header.compression(), payload.clone())?
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "transaction payload: payload_size={}, compression={:?}, uncompressed_size={}, events={}",
            header.payload_size,
            header.compression(),
            header.uncompressed_size,
            uncompressed_events.len()
        );
        Ok(TransactionPayloadData {
            payload_size: header.payload_size,
            compression_type: header.compression_type,
            uncompressed_size: header.uncompressed_size,
            payload,
            uncompressed_events,
        })
    }

    pub fn header(&self) -> PayloadHeader {
        PayloadHeader {
            payload_size: self.payload_size,
            compression_type: self.compression_type,
            uncompressed_size: self.uncompressed_size,
        }
    }

    pub fn compression(&self) -> CompressionType {
        CompressionType::from(self.compression_type)
    }

    /// iterate the embedded events again from the owned payload
    pub fn events(&self) -> Result<PayloadEvents> {
        PayloadEvents::new(self.compression(), self.payload.clone())
    }
}

/// writes header and payload, embedded events are expected to
/// be encoded in the payload already
impl WriteToBytes for TransactionPayloadData {
    fn write_to(self, out: &mut BytesMut) -> bytes_parser::Result<usize> {
        let mut len = self.header().write_to(out)?;
        len += out.write_bytes(self.payload)?;
        Ok(len)
    }
}

fn read_payload(input: &mut Bytes, payload_size: u32) -> Result<Bytes> {
    if payload_size > MAX_PAYLOAD_SIZE {
        return Err(Error::PayloadTooLarge(payload_size));
    }
    if input.remaining() < payload_size as usize {
        return Err(Error::TruncatedPayload {
            expected: payload_size,
            actual: input.remaining(),
        });
    }
    Ok(input.split_to(payload_size as usize))
}

/// lazy iterator of events embedded in a payload
///
/// only one event is held at a time, so the decompressed
/// transaction never resides in memory as a whole.
/// the decompressor is dropped once the stream ends or fails.
pub struct PayloadEvents {
    source: Option<Decompressor>,
    deserializer: EventDeserializer,
    index: usize,
}

impl PayloadEvents {
    pub fn new(compression: CompressionType, payload: Bytes) -> Result<Self> {
        if let CompressionType::Unknown(code) = compression {
            return Err(Error::UnsupportedCompression(code));
        }
        let source = if payload.is_empty() {
            None
        } else {
            Some(Decompressor::new(compression, payload)?)
        };
        // embedded events never carry checksum
        let opts = DeserializerOpts::default().checksum(false);
        Ok(PayloadEvents {
            source,
            deserializer: EventDeserializer::with_opts(opts),
            index: 0,
        })
    }
}

impl Iterator for PayloadEvents {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.source.as_mut()?;
        match self.deserializer.next_event(source) {
            Ok(Some(event)) => {
                log::trace!("payload event {}: {:?}", self.index, event.event_type());
                self.index += 1;
                Some(Ok(event))
            }
            Ok(None) => {
                self.source = None;
                None
            }
            Err(e) => {
                let err = match source.take_error() {
                    Some(msg) => Error::CorruptCompressedData(msg),
                    None => Error::SubEventDecodeError(self.index, Box::new(e)),
                };
                self.source = None;
                Some(Err(err))
            }
        }
    }
}

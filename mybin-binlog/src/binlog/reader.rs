//! binlog file reader
use super::deserializer::EventDeserializer;
use super::Event;
use crate::error::{Error, Result};
use crate::opts::DeserializerOpts;
use crate::util::read_full;
use std::io::Read;

/// magic number at the beginning of every binlog file
pub const BINLOG_MAGIC: [u8; 4] = *b"\xfebin";

/// reads events from a binlog file, or any source starting with
/// binlog magic number
///
/// usually the first event is FDE, which decides the checksum
/// of all following events.
pub struct BinlogFileReader<R> {
    source: R,
    deserializer: EventDeserializer,
    done: bool,
}

impl<R: Read> BinlogFileReader<R> {
    pub fn new(source: R) -> Result<Self> {
        Self::with_opts(source, DeserializerOpts::default())
    }

    /// consumes and verifies the magic number
    pub fn with_opts(mut source: R, opts: DeserializerOpts) -> Result<Self> {
        let mut magic = [0u8; 4];
        let n = read_full(&mut source, &mut magic)?;
        if magic[..n] != BINLOG_MAGIC[..] {
            return Err(Error::InvalidBinlogFormat(format!(
                "not a valid binary log: magic={}",
                hex::encode(&magic[..n])
            )));
        }
        Ok(BinlogFileReader {
            source,
            deserializer: EventDeserializer::with_opts(opts),
            done: false,
        })
    }

    /// returns None at end of file
    pub fn read_event(&mut self) -> Result<Option<Event>> {
        self.deserializer.next_event(&mut self.source)
    }

    pub fn deserializer(&self) -> &EventDeserializer {
        &self.deserializer
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

/// iteration stops after the first error
impl<R: Read> Iterator for BinlogFileReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Streaming record reader for ROS1 bag files.
//!
//! [`RecordReader`] turns a byte stream of known length into a lazy sequence
//! of [`BagRecord`]s. It does not look at payloads. Corrupt framing ends the
//! sequence with a single [`ConvertError::Framing`]; there is no
//! resynchronization.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use super::record::{
    BagRecord, Connection, MessageData, OpCode, RecordHeader, RecordKind, BAG_MAGIC,
};
use crate::core::{ConvertError, Result};

/// Lazy, non-restartable iterator over the records of one stream.
pub struct RecordReader<R> {
    reader: R,
    /// Total bytes in the stream
    len: u64,
    /// Bytes consumed so far
    pos: u64,
    /// Records yielded so far
    index: u64,
    /// Label used in errors (e.g., "bag", "chunk@4117")
    context: String,
    /// Set after the first error
    done: bool,
}

impl<R: Read> RecordReader<R> {
    /// Create a reader over a headerless record stream of `len` bytes.
    pub fn new(reader: R, len: u64, context: impl Into<String>) -> Self {
        Self {
            reader,
            len,
            pos: 0,
            index: 0,
            context: context.into(),
            done: false,
        }
    }

    /// Create a reader over a whole bag stream of `len` bytes, checking the
    /// `#ROSBAG V2.0` magic line first.
    pub fn bag(mut reader: R, len: u64) -> Result<Self> {
        let mut magic = [0u8; BAG_MAGIC.len()];
        if len < magic.len() as u64 {
            return Err(ConvertError::framing(
                "bag",
                0,
                0,
                format!("stream of {len} bytes is too short for a bag"),
            ));
        }
        reader
            .read_exact(&mut magic)
            .map_err(|e| ConvertError::framing("bag", 0, 0, format!("Failed to read magic: {e}")))?;
        if &magic != BAG_MAGIC {
            return Err(ConvertError::framing(
                "bag",
                0,
                0,
                format!(
                    "Invalid BAG magic: {:?}",
                    String::from_utf8_lossy(&magic).trim_end()
                ),
            ));
        }

        let mut records = Self::new(reader, len, "bag");
        records.pos = magic.len() as u64;
        Ok(records)
    }

    /// Label used in errors for this stream.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.pos
    }

    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    fn framing(&self, offset: u64, message: impl Into<String>) -> ConvertError {
        ConvertError::framing(self.context.clone(), offset, self.index, message)
    }

    fn read_io_error(&self, offset: u64, what: &str, err: io::Error) -> ConvertError {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            self.framing(offset, format!("short read of {what}"))
        } else {
            ConvertError::io(format!("reading {}", self.context), err.to_string())
        }
    }

    /// Read one `<len: u32><bytes>` block.
    fn read_block(&mut self, offset: u64, what: &str) -> Result<Vec<u8>> {
        let remaining = self.remaining();
        if remaining < 4 {
            return Err(self.framing(
                offset,
                format!("truncated {what} length prefix ({remaining} bytes left)"),
            ));
        }
        let block_len = self
            .reader
            .read_u32::<LittleEndian>()
            .map_err(|e| self.read_io_error(offset, what, e))?;
        self.pos += 4;

        if u64::from(block_len) > self.remaining() {
            return Err(self.framing(
                offset,
                format!(
                    "{what} length {block_len} exceeds remaining {} bytes",
                    self.remaining()
                ),
            ));
        }

        let mut block = vec![0u8; block_len as usize];
        self.reader
            .read_exact(&mut block)
            .map_err(|e| self.read_io_error(offset, what, e))?;
        self.pos += u64::from(block_len);
        Ok(block)
    }

    fn read_record(&mut self) -> Result<BagRecord> {
        let offset = self.pos;

        let header_bytes = self.read_block(offset, "header")?;
        let header = RecordHeader::parse(&header_bytes).map_err(|m| self.framing(offset, m))?;
        let data = self.read_block(offset, "data")?;

        let op_byte = header
            .op
            .ok_or_else(|| self.framing(offset, "record header has no op field"))?;
        let op = OpCode::from_u8(op_byte)
            .ok_or_else(|| self.framing(offset, format!("unknown op code 0x{op_byte:02x}")))?;

        let kind = match op {
            OpCode::Connection => RecordKind::Connection(self.connection(offset, header, &data)?),
            OpCode::MessageData => {
                let conn_id = header
                    .conn
                    .ok_or_else(|| self.framing(offset, "message data record has no conn field"))?;
                RecordKind::MessageData(MessageData {
                    conn_id,
                    time: header.time,
                    data,
                })
            }
            op => RecordKind::Other { op, header, data },
        };

        Ok(BagRecord {
            offset,
            index: self.index,
            kind,
        })
    }

    /// Build a connection from its record header and nested data header.
    fn connection(&self, offset: u64, header: RecordHeader, data: &[u8]) -> Result<Connection> {
        let conn_id = header
            .conn
            .ok_or_else(|| self.framing(offset, "connection record has no conn field"))?;
        let topic = header
            .topic
            .ok_or_else(|| self.framing(offset, "connection record has no topic field"))?;

        let fields = RecordHeader::parse(data)
            .map_err(|m| self.framing(offset, format!("connection data: {m}")))?;

        Ok(Connection {
            conn_id,
            topic,
            message_type: fields.message_type.unwrap_or_default(),
            md5sum: fields.md5sum.unwrap_or_default(),
            message_definition: fields.message_definition.unwrap_or_default(),
            callerid: fields.callerid,
            latching: fields.latching.as_deref() == Some("1"),
        })
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<BagRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.len {
            return None;
        }

        match self.read_record() {
            Ok(record) => {
                self.index += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reader for a bag file on disk.
pub struct BagReader {
    records: RecordReader<BufReader<File>>,
}

impl BagReader {
    /// Open a bag file and validate its magic line.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ConvertError::io(format!("open {}", path.display()), e.to_string()))?;
        let len = file
            .metadata()
            .map_err(|e| ConvertError::io(format!("stat {}", path.display()), e.to_string()))?
            .len();

        let records = RecordReader::bag(BufReader::new(file), len)?;
        Ok(Self { records })
    }
}

impl Iterator for BagReader {
    type Item = Result<BagRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next()
    }
}

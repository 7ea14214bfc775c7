// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record model for ROS1 bag files (version 2.0).
//!
//! ## Record Format
//! All records follow: `<header_len: u32><header><data_len: u32><data>`
//! where header contains `<field_len: u32><field_name>=<field_value>` pairs.
//!
//! ## Op Codes
//! - 0x02: Message data
//! - 0x03: Bag header
//! - 0x04: Index data
//! - 0x05: Chunk
//! - 0x06: Chunk info
//! - 0x07: Connection

use byteorder::{ByteOrder, LittleEndian};

/// Magic line at the start of every bag file.
pub const BAG_MAGIC: &[u8; 13] = b"#ROSBAG V2.0\n";

/// BAG op codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Message data (0x02)
    MessageData = 0x02,
    /// Bag header (0x03)
    BagHeader = 0x03,
    /// Index data (0x04)
    IndexData = 0x04,
    /// Chunk (0x05)
    Chunk = 0x05,
    /// Chunk info (0x06)
    ChunkInfo = 0x06,
    /// Connection (0x07)
    Connection = 0x07,
}

impl OpCode {
    /// Decode an op byte; `None` outside `0x02..=0x07`.
    pub fn from_u8(op: u8) -> Option<Self> {
        match op {
            0x02 => Some(OpCode::MessageData),
            0x03 => Some(OpCode::BagHeader),
            0x04 => Some(OpCode::IndexData),
            0x05 => Some(OpCode::Chunk),
            0x06 => Some(OpCode::ChunkInfo),
            0x07 => Some(OpCode::Connection),
            _ => None,
        }
    }

    /// The on-disk op byte.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Parsed fields from a BAG record header (or a connection record's data).
///
/// Unknown fields are ignored.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordHeader {
    /// Raw `op` byte
    pub op: Option<u8>,
    /// Connection id
    pub conn: Option<u32>,
    /// Record time `(sec, nsec)`
    pub time: Option<(u32, u32)>,
    /// Topic name
    pub topic: Option<String>,
    /// Message type (`type` field)
    pub message_type: Option<String>,
    /// MD5 checksum of the message definition
    pub md5sum: Option<String>,
    /// Full message definition text
    pub message_definition: Option<String>,
    /// Publishing node
    pub callerid: Option<String>,
    /// Latching flag (`"1"` or `"0"`)
    pub latching: Option<String>,
    /// Chunk compression (`none`, `bz2`, `lz4`)
    pub compression: Option<String>,
    /// Uncompressed chunk size
    pub size: Option<u32>,
    /// Position of the index section (bag header)
    pub index_pos: Option<u64>,
    /// Number of connections (bag header)
    pub conn_count: Option<u32>,
    /// Number of chunks (bag header)
    pub chunk_count: Option<u32>,
    /// Record count (index data, chunk info)
    pub count: Option<u32>,
}

impl RecordHeader {
    /// Parse a sequence of `<field_len: u32><name>=<value>` entries.
    ///
    /// On malformed input returns a message describing the defect; the
    /// caller attaches stream context.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, String> {
        let mut fields = RecordHeader::default();
        let mut pos = 0usize;

        while pos < bytes.len() {
            let remaining = bytes.len() - pos;
            if remaining < 4 {
                return Err(format!(
                    "truncated field length prefix ({remaining} bytes left in header)"
                ));
            }
            let field_len = LittleEndian::read_u32(&bytes[pos..pos + 4]) as usize;
            pos += 4;

            if field_len > bytes.len() - pos {
                return Err(format!(
                    "header field of {field_len} bytes overruns header ({} bytes left)",
                    bytes.len() - pos
                ));
            }
            let field = &bytes[pos..pos + field_len];
            pos += field_len;

            let eq_pos = field
                .iter()
                .position(|&b| b == b'=')
                .ok_or_else(|| "header field without '='".to_string())?;
            fields.parse_field(&field[..eq_pos], &field[eq_pos + 1..]);
        }

        Ok(fields)
    }

    /// Parse a single field from name and value bytes.
    fn parse_field(&mut self, name: &[u8], value: &[u8]) {
        match name {
            b"op" if value.len() == 1 => self.op = Some(value[0]),
            b"conn" if value.len() >= 4 => self.conn = Some(LittleEndian::read_u32(value)),
            b"time" if value.len() >= 8 => {
                self.time = Some((
                    LittleEndian::read_u32(&value[0..4]),
                    LittleEndian::read_u32(&value[4..8]),
                ));
            }
            b"topic" => self.topic = Some(lossy(value)),
            b"type" => self.message_type = Some(lossy(value)),
            b"md5sum" => self.md5sum = Some(lossy(value)),
            b"message_definition" => self.message_definition = Some(lossy(value)),
            b"callerid" => self.callerid = Some(lossy(value)),
            b"latching" => self.latching = Some(lossy(value)),
            b"compression" => self.compression = Some(lossy(value)),
            b"size" if value.len() >= 4 => self.size = Some(LittleEndian::read_u32(value)),
            b"index_pos" if value.len() >= 8 => {
                self.index_pos = Some(LittleEndian::read_u64(value));
            }
            b"conn_count" if value.len() >= 4 => {
                self.conn_count = Some(LittleEndian::read_u32(value));
            }
            b"chunk_count" if value.len() >= 4 => {
                self.chunk_count = Some(LittleEndian::read_u32(value));
            }
            b"count" if value.len() >= 4 => self.count = Some(LittleEndian::read_u32(value)),
            _ => {}
        }
    }
}

fn lossy(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}

/// A connection: binds a connection id to a topic and message schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    /// Connection ID
    pub conn_id: u32,
    /// Topic name
    pub topic: String,
    /// Message type (e.g., "geometry_msgs/PolygonStamped")
    pub message_type: String,
    /// MD5 sum of message definition
    pub md5sum: String,
    /// Message definition (ROS1 .msg text, with dependencies)
    pub message_definition: String,
    /// Caller ID (publishing node)
    pub callerid: Option<String>,
    /// Whether the publisher was latched
    pub latching: bool,
}

impl Connection {
    /// Whether `other` describes the same topic, type and md5sum.
    pub fn same_binding(&self, other: &Connection) -> bool {
        self.topic == other.topic
            && self.message_type == other.message_type
            && self.md5sum == other.md5sum
    }
}

/// A message-data record.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageData {
    /// Connection the message belongs to
    pub conn_id: u32,
    /// Record time `(sec, nsec)`, when present
    pub time: Option<(u32, u32)>,
    /// ROS1-serialized payload
    pub data: Vec<u8>,
}

/// Kind of a framed record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordKind {
    /// Connection record (op 0x07)
    Connection(Connection),
    /// Message-data record (op 0x02)
    MessageData(MessageData),
    /// Any other known record, passed through unparsed
    Other {
        /// Record op code
        op: OpCode,
        /// Parsed header fields
        header: RecordHeader,
        /// Raw record data
        data: Vec<u8>,
    },
}

/// One framed record and where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct BagRecord {
    /// Byte offset of the record's `header_len` prefix within its stream
    pub offset: u64,
    /// Zero-based index of the record within its stream
    pub index: u64,
    /// Record contents
    pub kind: RecordKind,
}

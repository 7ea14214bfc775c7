// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 bag file writer.
//!
//! # Layout
//!
//! 1. Version line: `#ROSBAG V2.0\n`
//! 2. Bag header record, padded so the file header is 4096 bytes
//! 3. Chunks (uncompressed), each holding connection and message-data
//!    records, followed by one index record per connection in the chunk
//! 4. Connection records (summary)
//! 5. Chunk info records (summary)
//!
//! The bag header is rewritten on [`BagWriter::finish`] with the index
//! position and counts.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use robomap::encoding::ros1::{POLYGON_STAMPED_DEFINITION, POLYGON_STAMPED_MD5, POLYGON_STAMPED_TYPE};
//! use robomap::io::formats::bag::BagWriter;
//!
//! let mut writer = BagWriter::create("output.bag")?;
//! let conn = writer.add_connection(
//!     "/xbot_monitoring/map",
//!     POLYGON_STAMPED_TYPE,
//!     POLYGON_STAMPED_MD5,
//!     POLYGON_STAMPED_DEFINITION,
//! )?;
//! writer.write_message(conn, (1_700_000_000, 0), &[0u8; 16])?;
//! writer.finish()?;
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::warn;

use super::record::{Connection, OpCode, BAG_MAGIC};
use crate::core::{ConvertError, Result};

/// Size of version line plus padded bag header record.
pub const FILE_HEADER_LEN: usize = 4096;

/// Index data version
const INDEX_VERSION: u32 = 1;

/// Chunk info version
const CHUNK_INFO_VERSION: u32 = 1;

/// Default chunk threshold (768KB)
const DEFAULT_CHUNK_THRESHOLD: usize = 768 * 1024;

/// Index entry for message lookup
#[derive(Debug, Clone, Copy)]
struct IndexEntry {
    /// Timestamp (sec, nsec)
    time: (u32, u32),
    /// Offset of the message record within the chunk data
    offset: u32,
}

/// Chunk info for the bag summary
#[derive(Debug, Clone)]
struct ChunkInfo {
    /// Position of the chunk record in the file
    pos: u64,
    /// Start time (sec, nsec)
    start_time: (u32, u32),
    /// End time (sec, nsec)
    end_time: (u32, u32),
    /// Message count per connection ID
    connection_counts: HashMap<u32, u32>,
}

/// ROS1 bag writer over any seekable sink.
///
/// You must call [`finish()`](BagWriter::finish) to finalize the bag; a
/// writer dropped while open leaves a bag without index and logs a warning.
pub struct BagWriter<W: Write + Seek> {
    /// Output sink, taken on finish
    writer: Option<W>,

    /// Mapping from topic to connection ID
    topic_connection_ids: HashMap<String, u32>,
    /// All connections
    connections: HashMap<u32, Connection>,
    /// All chunk infos
    chunk_infos: Vec<ChunkInfo>,

    /// Current chunk buffer (chunk header + data + index records)
    chunk_buffer: Vec<u8>,
    /// Current chunk info
    current_chunk_info: Option<ChunkInfo>,
    /// Current chunk indexes per connection
    current_chunk_indexes: HashMap<u32, Vec<IndexEntry>>,
    /// Connections written to current chunk
    connections_written_to_chunk: HashSet<u32>,

    /// Chunk size threshold
    chunk_threshold: usize,
    /// Next connection ID
    next_conn_id: u32,
    /// Total bytes written to the sink
    file_pos: u64,
    /// Messages written
    message_count: u64,
}

impl BagWriter<BufWriter<File>> {
    /// Create a new bag file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| ConvertError::io(format!("create {}", path.display()), e.to_string()))?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write + Seek> BagWriter<W> {
    /// Start a bag on `writer`, writing the placeholder file header.
    pub fn new(mut writer: W) -> Result<Self> {
        let mut start_buffer = Vec::with_capacity(FILE_HEADER_LEN);
        write_file_header_record(&mut start_buffer, 0, 0, 0);
        writer
            .write_all(&start_buffer)
            .map_err(|e| ConvertError::io("BagWriter: write header", e.to_string()))?;

        Ok(Self {
            writer: Some(writer),
            topic_connection_ids: HashMap::new(),
            connections: HashMap::new(),
            chunk_infos: Vec::new(),
            chunk_buffer: Vec::new(),
            current_chunk_info: None,
            current_chunk_indexes: HashMap::new(),
            connections_written_to_chunk: HashSet::new(),
            chunk_threshold: DEFAULT_CHUNK_THRESHOLD,
            next_conn_id: 0,
            file_pos: start_buffer.len() as u64,
            message_count: 0,
        })
    }

    /// Set the chunk size after which a chunk is flushed.
    pub fn with_chunk_threshold(mut self, threshold: usize) -> Self {
        self.chunk_threshold = threshold.max(1);
        self
    }

    /// Add a connection and return its id.
    ///
    /// Adding the same topic and type again returns the existing id; the
    /// same topic with another type is an error.
    pub fn add_connection(
        &mut self,
        topic: &str,
        message_type: &str,
        md5sum: &str,
        message_definition: &str,
    ) -> Result<u32> {
        self.ensure_open()?;

        if let Some(&existing) = self.topic_connection_ids.get(topic) {
            if let Some(conn) = self.connections.get(&existing) {
                if conn.message_type == message_type {
                    return Ok(existing);
                }
                return Err(ConvertError::schema(
                    existing,
                    format!(
                        "topic {topic} already written as {}, not {message_type}",
                        conn.message_type
                    ),
                ));
            }
        }

        let conn_id = self.next_conn_id;
        self.next_conn_id += 1;

        self.topic_connection_ids.insert(topic.to_string(), conn_id);
        self.connections.insert(
            conn_id,
            Connection {
                conn_id,
                topic: topic.to_string(),
                message_type: message_type.to_string(),
                md5sum: md5sum.to_string(),
                message_definition: message_definition.to_string(),
                callerid: None,
                latching: false,
            },
        );

        Ok(conn_id)
    }

    /// Write one serialized message on a connection from
    /// [`add_connection`](Self::add_connection).
    pub fn write_message(&mut self, conn_id: u32, time: (u32, u32), data: &[u8]) -> Result<()> {
        self.ensure_open()?;

        if !self.connections.contains_key(&conn_id) {
            return Err(ConvertError::io(
                "BagWriter",
                format!(
                    "No connection found for conn_id {conn_id} (only {} connections added)",
                    self.next_conn_id
                ),
            ));
        }
        let data_len = u32::try_from(data.len()).map_err(|_| {
            ConvertError::io("BagWriter", format!("message of {} bytes", data.len()))
        })?;

        // Start a chunk if none is in progress
        if self.current_chunk_info.is_none() {
            self.start_chunk(time);
        }

        if let Some(chunk_info) = self.current_chunk_info.as_mut() {
            if time < chunk_info.start_time {
                chunk_info.start_time = time;
            }
            if chunk_info.end_time < time {
                chunk_info.end_time = time;
            }
            *chunk_info.connection_counts.entry(conn_id).or_default() += 1;
        }

        if self.connections_written_to_chunk.insert(conn_id) {
            if let Some(conn) = self.connections.get(&conn_id) {
                write_connection_record(&mut self.chunk_buffer, conn);
            }
        }

        let offset = self.chunk_buffer.len() - chunk_header_length();

        let mut fields = BTreeMap::new();
        fields.insert("op".to_string(), vec![OpCode::MessageData.as_u8()]);
        fields.insert("conn".to_string(), u32_to_bytes(conn_id));
        fields.insert("time".to_string(), time_to_bytes(time));
        write_header(&mut self.chunk_buffer, &fields);
        write_u32(&mut self.chunk_buffer, data_len);
        self.chunk_buffer.extend_from_slice(data);

        self.current_chunk_indexes
            .entry(conn_id)
            .or_default()
            .push(IndexEntry {
                time,
                offset: offset as u32,
            });
        self.message_count += 1;

        if self.chunk_buffer.len() >= self.chunk_threshold {
            self.finish_chunk()?;
        }

        Ok(())
    }

    /// Messages written so far.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Connections added so far.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.writer.is_none() {
            return Err(ConvertError::io("BagWriter", "bag already finished"));
        }
        Ok(())
    }

    fn sink(&mut self) -> Result<&mut W> {
        self.writer
            .as_mut()
            .ok_or_else(|| ConvertError::io("BagWriter", "bag already finished"))
    }

    fn start_chunk(&mut self, time: (u32, u32)) {
        self.current_chunk_info = Some(ChunkInfo {
            pos: self.file_pos,
            start_time: time,
            end_time: time,
            connection_counts: HashMap::new(),
        });

        // Placeholder, rewritten once the size is known
        write_chunk_header(&mut self.chunk_buffer, 0);
        self.connections_written_to_chunk.clear();
    }

    fn finish_chunk(&mut self) -> Result<()> {
        let Some(chunk_info) = self.current_chunk_info.take() else {
            return Ok(());
        };

        let header_len = chunk_header_length();
        let chunk_data_len = (self.chunk_buffer.len() - header_len) as u32;

        let mut header_buffer = Vec::with_capacity(header_len);
        write_chunk_header(&mut header_buffer, chunk_data_len);
        self.chunk_buffer[..header_len].copy_from_slice(&header_buffer);

        write_index_records(&mut self.chunk_buffer, &self.current_chunk_indexes);

        let buffer = std::mem::take(&mut self.chunk_buffer);
        self.sink()?
            .write_all(&buffer)
            .map_err(|e| ConvertError::io("BagWriter: write chunk", e.to_string()))?;
        self.file_pos += buffer.len() as u64;

        self.chunk_infos.push(chunk_info);
        self.current_chunk_indexes.clear();
        Ok(())
    }

    /// Write the index section, rewrite the bag header and return the sink.
    pub fn finish(mut self) -> Result<W> {
        self.finish_chunk()?;

        let index_pos = self.file_pos;

        let mut stop_buffer = Vec::new();
        let mut ids: Vec<u32> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(conn) = self.connections.get(&id) {
                write_connection_record(&mut stop_buffer, conn);
            }
        }
        write_chunk_info_records(&mut stop_buffer, &self.chunk_infos);

        let mut header_buffer = Vec::with_capacity(FILE_HEADER_LEN);
        write_file_header_record(
            &mut header_buffer,
            self.connections.len() as u32,
            self.chunk_infos.len() as u32,
            index_pos,
        );

        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| ConvertError::io("BagWriter", "bag already finished"))?;
        let io_err = |what: &str, e: std::io::Error| {
            ConvertError::io(format!("BagWriter: {what}"), e.to_string())
        };
        writer
            .write_all(&stop_buffer)
            .map_err(|e| io_err("write index", e))?;
        writer
            .seek(SeekFrom::Start(0))
            .map_err(|e| io_err("seek", e))?;
        writer
            .write_all(&header_buffer)
            .map_err(|e| io_err("update header", e))?;
        writer.seek(SeekFrom::End(0)).map_err(|e| io_err("seek", e))?;
        writer.flush().map_err(|e| io_err("flush", e))?;

        Ok(writer)
    }
}

impl<W: Write + Seek> Drop for BagWriter<W> {
    fn drop(&mut self) {
        if self.writer.is_some() {
            warn!("BagWriter dropped without calling finish()");
        }
    }
}

// =============================================================================
// Record helpers
// =============================================================================

/// Write a header as key=value pairs.
fn write_header(buffer: &mut Vec<u8>, fields: &BTreeMap<String, Vec<u8>>) -> u32 {
    let mut header_data = Vec::new();

    for (key, value) in fields {
        let field_len = key.len() + 1 + value.len();
        write_u32(&mut header_data, field_len as u32);
        header_data.extend_from_slice(key.as_bytes());
        header_data.push(b'=');
        header_data.extend_from_slice(value);
    }

    let header_len = header_data.len() as u32;
    write_u32(buffer, header_len);
    buffer.extend(header_data);

    header_len
}

/// Write version line and bag header record, padded to 4096 bytes.
fn write_file_header_record(
    buffer: &mut Vec<u8>,
    connection_count: u32,
    chunk_count: u32,
    index_pos: u64,
) {
    buffer.extend_from_slice(BAG_MAGIC);
    let version_len = buffer.len();

    let mut fields = BTreeMap::new();
    fields.insert("op".to_string(), vec![OpCode::BagHeader.as_u8()]);
    fields.insert("index_pos".to_string(), u64_to_bytes(index_pos));
    fields.insert("conn_count".to_string(), u32_to_bytes(connection_count));
    fields.insert("chunk_count".to_string(), u32_to_bytes(chunk_count));

    let header_len = write_header(buffer, &fields);

    // version + header_len + header + data_len + padding = 4096
    let used = version_len + 4 + header_len as usize + 4;
    let data_len = FILE_HEADER_LEN - used;

    write_u32(buffer, data_len as u32);
    buffer.resize(buffer.len() + data_len, b' ');
}

/// Write a chunk header with `compression=none`.
fn write_chunk_header(buffer: &mut Vec<u8>, size: u32) {
    let mut fields = BTreeMap::new();
    fields.insert("op".to_string(), vec![OpCode::Chunk.as_u8()]);
    fields.insert("compression".to_string(), b"none".to_vec());
    fields.insert("size".to_string(), u32_to_bytes(size));

    write_header(buffer, &fields);
    // Uncompressed: data length equals size
    write_u32(buffer, size);
}

/// Length of a chunk header, including the data length prefix.
fn chunk_header_length() -> usize {
    let mut temp = Vec::new();
    write_chunk_header(&mut temp, 0);
    temp.len()
}

fn write_connection_record(buffer: &mut Vec<u8>, conn: &Connection) {
    let mut fields = BTreeMap::new();
    fields.insert("op".to_string(), vec![OpCode::Connection.as_u8()]);
    fields.insert("conn".to_string(), u32_to_bytes(conn.conn_id));
    fields.insert("topic".to_string(), conn.topic.as_bytes().to_vec());
    write_header(buffer, &fields);

    // Connection data is itself a field header
    let mut data_fields = BTreeMap::new();
    data_fields.insert("topic".to_string(), conn.topic.as_bytes().to_vec());
    data_fields.insert("type".to_string(), conn.message_type.as_bytes().to_vec());
    data_fields.insert("md5sum".to_string(), conn.md5sum.as_bytes().to_vec());
    data_fields.insert(
        "message_definition".to_string(),
        conn.message_definition.as_bytes().to_vec(),
    );
    if let Some(callerid) = &conn.callerid {
        data_fields.insert("callerid".to_string(), callerid.as_bytes().to_vec());
    }
    data_fields.insert(
        "latching".to_string(),
        if conn.latching { b"1".to_vec() } else { b"0".to_vec() },
    );
    write_header(buffer, &data_fields);
}

fn write_index_records(buffer: &mut Vec<u8>, indexes: &HashMap<u32, Vec<IndexEntry>>) {
    let mut ids: Vec<&u32> = indexes.keys().collect();
    ids.sort();

    for conn_id in ids {
        let Some(entries) = indexes.get(conn_id) else {
            continue;
        };
        let mut fields = BTreeMap::new();
        fields.insert("op".to_string(), vec![OpCode::IndexData.as_u8()]);
        fields.insert("conn".to_string(), u32_to_bytes(*conn_id));
        fields.insert("ver".to_string(), u32_to_bytes(INDEX_VERSION));
        fields.insert("count".to_string(), u32_to_bytes(entries.len() as u32));
        write_header(buffer, &fields);

        // 8 bytes time + 4 bytes offset per entry
        write_u32(buffer, (entries.len() * 12) as u32);
        for entry in entries {
            write_u32(buffer, entry.time.0);
            write_u32(buffer, entry.time.1);
            write_u32(buffer, entry.offset);
        }
    }
}

fn write_chunk_info_records(buffer: &mut Vec<u8>, chunk_infos: &[ChunkInfo]) {
    for chunk_info in chunk_infos {
        let mut fields = BTreeMap::new();
        fields.insert("op".to_string(), vec![OpCode::ChunkInfo.as_u8()]);
        fields.insert("ver".to_string(), u32_to_bytes(CHUNK_INFO_VERSION));
        fields.insert("chunk_pos".to_string(), u64_to_bytes(chunk_info.pos));
        fields.insert("start_time".to_string(), time_to_bytes(chunk_info.start_time));
        fields.insert("end_time".to_string(), time_to_bytes(chunk_info.end_time));
        fields.insert(
            "count".to_string(),
            u32_to_bytes(chunk_info.connection_counts.len() as u32),
        );
        write_header(buffer, &fields);

        write_u32(buffer, (chunk_info.connection_counts.len() * 8) as u32);
        let mut counts: Vec<(&u32, &u32)> = chunk_info.connection_counts.iter().collect();
        counts.sort();
        for (conn_id, count) in counts {
            write_u32(buffer, *conn_id);
            write_u32(buffer, *count);
        }
    }
}

/// Write u32 in little-endian format.
fn write_u32(buffer: &mut Vec<u8>, value: u32) {
    buffer.extend_from_slice(&value.to_le_bytes());
}

fn u32_to_bytes(value: u32) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

fn u64_to_bytes(value: u64) -> Vec<u8> {
    value.to_le_bytes().to_vec()
}

/// Convert (sec, nsec) time to little-endian bytes.
fn time_to_bytes(time: (u32, u32)) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(8);
    bytes.extend_from_slice(&time.0.to_le_bytes());
    bytes.extend_from_slice(&time.1.to_le_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::formats::bag::reader::RecordReader;
    use crate::io::formats::bag::record::{BagRecord, RecordKind};
    use std::io::Cursor;

    fn finished(writer: BagWriter<Cursor<Vec<u8>>>) -> Vec<u8> {
        writer.finish().unwrap().into_inner()
    }

    fn read_all(bytes: Vec<u8>) -> Vec<BagRecord> {
        let len = bytes.len() as u64;
        RecordReader::bag(Cursor::new(bytes), len)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_write_u32() {
        let mut buffer = Vec::new();
        write_u32(&mut buffer, 0x12345678);
        assert_eq!(buffer, vec![0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn test_file_header_is_4096_bytes() {
        let mut buffer = Vec::new();
        write_file_header_record(&mut buffer, 3, 1, 123_456);
        assert_eq!(buffer.len(), FILE_HEADER_LEN);
        assert!(buffer.starts_with(BAG_MAGIC));
    }

    #[test]
    fn test_empty_bag_is_header_only() {
        let bytes = finished(BagWriter::new(Cursor::new(Vec::new())).unwrap());
        assert_eq!(bytes.len(), FILE_HEADER_LEN);

        let records = read_all(bytes);
        assert_eq!(records.len(), 1);
        match &records[0].kind {
            RecordKind::Other { op, header, .. } => {
                assert_eq!(*op, OpCode::BagHeader);
                assert_eq!(header.index_pos, Some(FILE_HEADER_LEN as u64));
                assert_eq!(header.conn_count, Some(0));
                assert_eq!(header.chunk_count, Some(0));
            }
            other => panic!("expected bag header, got {other:?}"),
        }
    }

    #[test]
    fn test_header_points_at_index_section() {
        let mut writer = BagWriter::new(Cursor::new(Vec::new())).unwrap();
        let conn = writer.add_connection("/map", "pkg/Msg", "md5", "int32 x").unwrap();
        writer.write_message(conn, (1, 0), &[1, 0, 0, 0]).unwrap();
        let bytes = finished(writer);

        let records = read_all(bytes.clone());
        let index_pos = match &records[0].kind {
            RecordKind::Other { header, .. } => header.index_pos.unwrap(),
            other => panic!("expected bag header, got {other:?}"),
        };
        assert_eq!(index_pos, records[3].offset);
        assert!(matches!(records[3].kind, RecordKind::Connection(_)));
        assert!(matches!(
            records[4].kind,
            RecordKind::Other {
                op: OpCode::ChunkInfo,
                ..
            }
        ));
        assert_eq!(records.len(), 5);
    }

    #[test]
    fn test_add_connection_is_idempotent_per_topic() {
        let mut writer = BagWriter::new(Cursor::new(Vec::new())).unwrap();
        let a = writer.add_connection("/map", "pkg/Msg", "", "").unwrap();
        let b = writer.add_connection("/map", "pkg/Msg", "", "").unwrap();
        let c = writer.add_connection("/other", "pkg/Msg", "", "").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(writer.add_connection("/map", "pkg/Other", "", "").is_err());
        assert_eq!(writer.connection_count(), 2);
        writer.finish().unwrap();
    }

    #[test]
    fn test_unknown_connection_rejected() {
        let mut writer = BagWriter::new(Cursor::new(Vec::new())).unwrap();
        assert!(writer.write_message(4, (0, 0), &[]).is_err());
        writer.finish().unwrap();
    }

    #[test]
    fn test_small_threshold_splits_chunks() {
        let mut writer = BagWriter::new(Cursor::new(Vec::new()))
            .unwrap()
            .with_chunk_threshold(1);
        let conn = writer.add_connection("/map", "pkg/Msg", "", "").unwrap();
        for i in 0..3u32 {
            writer.write_message(conn, (i, 0), &i.to_le_bytes()).unwrap();
        }
        assert_eq!(writer.message_count(), 3);
        let records = read_all(finished(writer));

        let chunks = records
            .iter()
            .filter(|r| matches!(r.kind, RecordKind::Other { op: OpCode::Chunk, .. }))
            .count();
        assert_eq!(chunks, 3);
    }
}

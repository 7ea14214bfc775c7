// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message demultiplexer for ROS1 bag record streams.
//!
//! Registers connection records, expands chunks in place, resolves
//! message-data records to their connection and applies the topic filter.
//! Payloads are never looked at here.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use tracing::debug;

use super::reader::RecordReader;
use super::record::{BagRecord, Connection, OpCode, RecordHeader, RecordKind};
use crate::core::{ConvertError, Result};
use crate::io::filter::TopicFilter;

/// Connections registered during one run, keyed by connection id.
#[derive(Debug, Default, Clone)]
pub struct ConnectionTable {
    by_id: HashMap<u32, Arc<Connection>>,
    /// Registration order, for stable listings
    order: Vec<u32>,
}

impl ConnectionTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection.
    ///
    /// Returns `Ok(true)` for a new id and `Ok(false)` when the id is already
    /// bound to the same topic, type and md5sum (bags repeat connection
    /// records).
    /// A different binding for a known id is a [`ConvertError::Schema`].
    pub fn register(&mut self, connection: Connection) -> Result<bool> {
        if let Some(existing) = self.by_id.get(&connection.conn_id) {
            if existing.same_binding(&connection) {
                return Ok(false);
            }
            return Err(ConvertError::schema(
                connection.conn_id,
                format!(
                    "registered as {} ({}, {}), re-registered as {} ({}, {})",
                    existing.topic,
                    existing.message_type,
                    existing.md5sum,
                    connection.topic,
                    connection.message_type,
                    connection.md5sum
                ),
            ));
        }

        self.order.push(connection.conn_id);
        self.by_id.insert(connection.conn_id, Arc::new(connection));
        Ok(true)
    }

    /// Look up a connection by id.
    pub fn get(&self, conn_id: u32) -> Option<&Arc<Connection>> {
        self.by_id.get(&conn_id)
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Whether no connection is registered.
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Connections in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Connection>> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

/// A message-data record resolved to its connection.
#[derive(Debug, Clone)]
pub struct MatchedMessage {
    /// Connection the record belongs to
    pub connection: Arc<Connection>,
    /// Record header time `(sec, nsec)`, when present
    pub time: Option<(u32, u32)>,
    /// ROS1-serialized payload
    pub data: Vec<u8>,
    /// Index of the record within its stream
    pub record_index: u64,
}

/// Counters gathered while demultiplexing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DemuxStats {
    /// Records seen, including records inside chunks
    pub records: u64,
    /// Chunks expanded
    pub chunks: u64,
    /// Distinct connections registered
    pub connections: u64,
    /// Messages yielded
    pub matched: u64,
    /// Messages dropped by the topic filter
    pub filtered: u64,
    /// Messages whose connection id was never registered
    pub unresolved: u64,
}

/// Iterator adapter from records to matched messages.
pub struct Demultiplexer<I> {
    records: I,
    /// Records of the chunk currently being expanded
    chunk: Option<RecordReader<Cursor<Vec<u8>>>>,
    table: ConnectionTable,
    filter: TopicFilter,
    stats: DemuxStats,
    done: bool,
}

impl<I> Demultiplexer<I>
where
    I: Iterator<Item = Result<BagRecord>>,
{
    /// Create a demultiplexer with an empty connection table.
    pub fn new(records: I, filter: TopicFilter) -> Self {
        Self {
            records,
            chunk: None,
            table: ConnectionTable::new(),
            filter,
            stats: DemuxStats::default(),
            done: false,
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    /// Connections registered so far.
    pub fn connections(&self) -> &ConnectionTable {
        &self.table
    }

    /// Consume the demultiplexer, returning its table and counters.
    pub fn into_parts(self) -> (ConnectionTable, DemuxStats) {
        (self.table, self.stats)
    }

    fn next_record(&mut self) -> Option<Result<BagRecord>> {
        if let Some(chunk) = self.chunk.as_mut() {
            if let Some(record) = chunk.next() {
                return Some(record);
            }
            self.chunk = None;
        }
        self.records.next()
    }

    /// Handle one record; `Some` when it yields a message.
    fn route(&mut self, record: BagRecord) -> Result<Option<MatchedMessage>> {
        self.stats.records += 1;

        match record.kind {
            RecordKind::Connection(connection) => {
                if self.table.register(connection)? {
                    self.stats.connections += 1;
                }
                Ok(None)
            }
            RecordKind::MessageData(message) => {
                let Some(connection) = self.table.get(message.conn_id) else {
                    self.stats.unresolved += 1;
                    debug!(
                        conn = message.conn_id,
                        record = record.index,
                        "dropping message on unregistered connection"
                    );
                    return Ok(None);
                };
                if !self.filter.should_include(&connection.topic) {
                    self.stats.filtered += 1;
                    return Ok(None);
                }

                self.stats.matched += 1;
                Ok(Some(MatchedMessage {
                    connection: Arc::clone(connection),
                    time: message.time,
                    data: message.data,
                    record_index: record.index,
                }))
            }
            RecordKind::Other {
                op: OpCode::Chunk,
                header,
                data,
            } => {
                let context = self
                    .chunk
                    .as_ref()
                    .map(|c| c.context().to_string())
                    .unwrap_or_else(|| "bag".to_string());
                if self.chunk.is_some() {
                    return Err(ConvertError::framing(
                        context,
                        record.offset,
                        record.index,
                        "chunk nested inside a chunk",
                    ));
                }

                let body = decompress_chunk(&header, data, record.offset, record.index)?;
                let len = body.len() as u64;
                self.chunk = Some(RecordReader::new(
                    Cursor::new(body),
                    len,
                    format!("chunk@{}", record.offset),
                ));
                self.stats.chunks += 1;
                Ok(None)
            }
            RecordKind::Other { .. } => Ok(None),
        }
    }
}

impl<I> Iterator for Demultiplexer<I>
where
    I: Iterator<Item = Result<BagRecord>>,
{
    type Item = Result<MatchedMessage>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let record = match self.next_record()? {
                Ok(record) => record,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            match self.route(record) {
                Ok(Some(message)) => return Some(Ok(message)),
                Ok(None) => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Decompress a chunk record's data according to its `compression` field.
///
/// A missing field means `none`. Compressed chunks must carry a `size`
/// field; decompression stops one byte past it. The result must match
/// `size` when one is present.
pub fn decompress_chunk(
    header: &RecordHeader,
    data: Vec<u8>,
    offset: u64,
    index: u64,
) -> Result<Vec<u8>> {
    let compression = header.compression.as_deref().unwrap_or("none");
    let framing = |message: String| ConvertError::framing("bag", offset, index, message);

    let body = match compression {
        "none" => data,
        "bz2" | "lz4" => {
            let size = header
                .size
                .ok_or_else(|| framing(format!("{compression} chunk has no size field")))?;
            let result = if compression == "bz2" {
                inflate(bzip2::read::BzDecoder::new(&data[..]), size)
            } else {
                // rosbag writes LZ4 frames (roslz4), not size-prepended blocks.
                inflate(lz4_flex::frame::FrameDecoder::new(&data[..]), size)
            };
            let body = result.map_err(|e| {
                framing(format!(
                    "{} decompression failed: {e}",
                    compression.to_uppercase()
                ))
            })?;
            if body.len() as u64 > u64::from(size) {
                return Err(framing(format!(
                    "chunk decompresses past {size} bytes declared in its header"
                )));
            }
            body
        }
        other => {
            return Err(ConvertError::unsupported(format!(
                "chunk compression '{other}' at byte {offset}"
            )))
        }
    };

    if let Some(size) = header.size {
        if body.len() as u64 != u64::from(size) {
            return Err(framing(format!(
                "chunk decompressed to {} bytes, header says {size}",
                body.len()
            )));
        }
    }

    Ok(body)
}

/// Read at most `size + 1` decompressed bytes.
fn inflate<R: Read>(decoder: R, size: u32) -> std::io::Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    decoder
        .take(u64::from(size) + 1)
        .read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

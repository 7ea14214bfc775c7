// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! BAG format implementation.
//!
//! - [`reader`]: sequential record framing over a bag or chunk stream
//! - [`demux`]: connection registry, chunk expansion, topic filtering
//! - [`writer`]: minimal bag writer (uncompressed chunks plus index)

pub mod demux;
pub mod reader;
pub mod record;
pub mod writer;

pub use demux::{ConnectionTable, DemuxStats, Demultiplexer, MatchedMessage};
pub use reader::{BagReader, RecordReader};
pub use record::{BagRecord, Connection, MessageData, OpCode, RecordHeader, RecordKind};
pub use writer::BagWriter;

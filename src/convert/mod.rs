// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Conversion pipelines.
//!
//! - [`to_geojson`] - bag to `FeatureCollection`
//! - [`to_bag`] - `FeatureCollection` to bag
//! - [`inspect`] - connection and message counts of a bag
//!
//! File-level entry points write to a temporary file next to the output
//! and rename it into place only after the whole conversion succeeded.

pub mod inspect;
pub mod to_bag;
pub mod to_geojson;

use std::fmt;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::{ConvertError, Result};
use crate::io::formats::bag::DemuxStats;

pub use inspect::{inspect_bag, BagSummary, TopicSummary};
pub use to_bag::{geojson_to_bag, write_collection};
pub use to_geojson::{bag_to_geojson, extract_collection};

/// Counters for one conversion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConvertStats {
    /// Records read, including records inside chunks
    pub records: u64,
    /// Chunks expanded
    pub chunks: u64,
    /// Connections registered (extraction) or written (writing)
    pub connections: u64,
    /// Messages matched by the topic filter (extraction) or written (writing)
    pub messages: u64,
    /// Features emitted (extraction) or read (writing)
    pub features: u64,
    /// Messages dropped by the topic filter
    pub filtered: u64,
    /// Messages on a connection id that was never registered
    pub unresolved: u64,
    /// Messages skipped because their definition could not be parsed
    pub schema_failures: u64,
    /// Messages skipped because their payload could not be decoded
    pub decode_failures: u64,
    /// Point fields or features skipped because no ring could be built
    pub geometry_failures: u64,
}

impl ConvertStats {
    /// Records or features skipped for a recoverable error.
    pub fn skipped(&self) -> u64 {
        self.schema_failures + self.decode_failures + self.geometry_failures
    }

    fn absorb_demux(&mut self, demux: DemuxStats) {
        self.records = demux.records;
        self.chunks = demux.chunks;
        self.connections = demux.connections;
        self.messages = demux.matched;
        self.filtered = demux.filtered;
        self.unresolved = demux.unresolved;
    }

    /// Count one recoverable error in the matching bucket.
    fn count_failure(&mut self, error: &ConvertError) {
        match error {
            ConvertError::InvalidSchema { .. } => self.schema_failures += 1,
            ConvertError::Geometry { .. } => self.geometry_failures += 1,
            _ => self.decode_failures += 1,
        }
    }
}

impl fmt::Display for ConvertStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} features from {} messages ({} records, {} chunks, {} connections); \
             skipped: {} schema, {} decode, {} geometry; dropped: {} filtered, {} unresolved",
            self.features,
            self.messages,
            self.records,
            self.chunks,
            self.connections,
            self.schema_failures,
            self.decode_failures,
            self.geometry_failures,
            self.filtered,
            self.unresolved,
        )
    }
}

/// A temporary file in the directory `output` will be renamed into.
fn temp_file_beside(output: &Path) -> Result<NamedTempFile> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    NamedTempFile::new_in(dir).map_err(|e| {
        ConvertError::io(
            format!("create temporary file in {}", dir.display()),
            e.to_string(),
        )
    })
}

/// Atomically move a finished temporary file to `output`.
fn persist(file: NamedTempFile, output: &Path) -> Result<()> {
    file.persist(output).map_err(|e| {
        ConvertError::io(format!("rename into {}", output.display()), e.error.to_string())
    })?;
    Ok(())
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.
//!
//! Bags are assembled byte by byte here, independently of the crate's own
//! writer, so reader tests do not depend on writer behavior.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

pub const MAP_TOPIC: &str = "/xbot_monitoring/map";

/// A boundary message with full-precision points.
pub const BOUNDARY_TYPE: &str = "mower_msgs/Boundary";
pub const BOUNDARY_DEFINITION: &str = "\
# Map boundary published by the mower
Header header
string name
geometry_msgs/Point[] points
";

/// A map with named areas, each carrying its own outline.
pub const MAP_TYPE: &str = "mower_msgs/MowerMap";
pub const MAP_DEFINITION: &str = "\
Header header
MapArea[] areas
geometry_msgs/Point dock
================================================================================
MSG: mower_msgs/MapArea
string name
geometry_msgs/Polygon outline
geometry_msgs/Point[] obstacles
================================================================================
MSG: std_msgs/Header
uint32 seq
time stamp
string frame_id
================================================================================
MSG: geometry_msgs/Polygon
geometry_msgs/Point32[] points
================================================================================
MSG: geometry_msgs/Point32
float32 x
float32 y
float32 z
================================================================================
MSG: geometry_msgs/Point
float64 x
float64 y
float64 z
";

// ============================================================================
// Record framing
// ============================================================================

/// Encode a `<len><name>=<value>` header.
pub fn header(fields: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    for (name, value) in fields {
        let len = (name.len() + 1 + value.len()) as u32;
        out.extend_from_slice(&len.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value);
    }
    out
}

/// Encode one record.
pub fn record(fields: &[(&str, Vec<u8>)], data: &[u8]) -> Vec<u8> {
    let header = header(fields);
    let mut out = Vec::new();
    out.extend_from_slice(&(header.len() as u32).to_le_bytes());
    out.extend_from_slice(&header);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    out
}

pub fn connection_record(conn_id: u32, topic: &str, message_type: &str, definition: &str) -> Vec<u8> {
    let data = header(&[
        ("topic", topic.as_bytes().to_vec()),
        ("type", message_type.as_bytes().to_vec()),
        ("md5sum", b"*".to_vec()),
        ("message_definition", definition.as_bytes().to_vec()),
    ]);
    record(
        &[
            ("op", vec![0x07]),
            ("conn", conn_id.to_le_bytes().to_vec()),
            ("topic", topic.as_bytes().to_vec()),
        ],
        &data,
    )
}

pub fn message_record(conn_id: u32, time: Option<(u32, u32)>, payload: &[u8]) -> Vec<u8> {
    let mut fields = vec![("op", vec![0x02]), ("conn", conn_id.to_le_bytes().to_vec())];
    if let Some((secs, nsecs)) = time {
        let mut value = secs.to_le_bytes().to_vec();
        value.extend_from_slice(&nsecs.to_le_bytes());
        fields.push(("time", value));
    }
    record(&fields, payload)
}

/// A chunk record wrapping `inner` records.
pub fn chunk_record(compression: &str, inner: &[u8]) -> Vec<u8> {
    let data = match compression {
        "bz2" => {
            let mut encoder =
                bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            encoder.write_all(inner).unwrap();
            encoder.finish().unwrap()
        }
        "lz4" => {
            let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
            encoder.write_all(inner).unwrap();
            encoder.finish().unwrap()
        }
        _ => inner.to_vec(),
    };
    record(
        &[
            ("op", vec![0x05]),
            ("compression", compression.as_bytes().to_vec()),
            ("size", (inner.len() as u32).to_le_bytes().to_vec()),
        ],
        &data,
    )
}

/// Magic line plus a bag header record.
pub fn bag_start() -> Vec<u8> {
    let mut out = b"#ROSBAG V2.0\n".to_vec();
    out.extend(record(
        &[
            ("op", vec![0x03]),
            ("index_pos", 0u64.to_le_bytes().to_vec()),
            ("conn_count", 0u32.to_le_bytes().to_vec()),
            ("chunk_count", 0u32.to_le_bytes().to_vec()),
        ],
        &[b' '; 32],
    ));
    out
}

/// A full bag from records.
pub fn bag(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = bag_start();
    for record in records {
        out.extend_from_slice(record);
    }
    out
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Default)]
pub struct Payload(pub Vec<u8>);

impl Payload {
    pub fn u32(mut self, v: u32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(mut self, v: f64) -> Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn string(self, s: &str) -> Self {
        let mut this = self.u32(s.len() as u32);
        this.0.extend_from_slice(s.as_bytes());
        this
    }

    pub fn header(self, seq: u32, stamp: (u32, u32), frame_id: &str) -> Self {
        self.u32(seq).u32(stamp.0).u32(stamp.1).string(frame_id)
    }

    /// `geometry_msgs/Point[]`
    pub fn points(self, points: &[[f64; 2]]) -> Self {
        let mut this = self.u32(points.len() as u32);
        for [x, y] in points {
            this = this.f64(*x).f64(*y).f64(0.0);
        }
        this
    }

    /// `geometry_msgs/Point32[]`
    pub fn points32(self, points: &[[f32; 2]]) -> Self {
        let mut this = self.u32(points.len() as u32);
        for [x, y] in points {
            this = this.f32(*x).f32(*y).f32(0.0);
        }
        this
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

/// `mower_msgs/Boundary` with a zero header stamp.
pub fn boundary(name: &str, points: &[[f64; 2]]) -> Vec<u8> {
    Payload::default()
        .header(0, (0, 0), "map")
        .string(name)
        .points(points)
        .build()
}

// ============================================================================
// Files
// ============================================================================

/// Write `bytes` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Read and parse a GeoJSON output file.
pub fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// The exterior rings of every feature of a GeoJSON value.
pub fn rings(document: &serde_json::Value) -> Vec<Vec<[f64; 2]>> {
    document["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|feature| {
            feature["geometry"]["coordinates"][0]
                .as_array()
                .unwrap()
                .iter()
                .map(|p| [p[0].as_f64().unwrap(), p[1].as_f64().unwrap()])
                .collect()
        })
        .collect()
}

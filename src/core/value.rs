// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoded value type system.
//!
//! Provides a generic, schema-ordered value tree for decoded ROS1 payloads.
//! Producers drift between message versions, so the extractor never relies
//! on a fixed struct per message type; it inspects this tree instead.

use indexmap::IndexMap;
use std::fmt;

/// Decoded message as field name -> value mapping, in schema field order.
pub type DecodedMessage = IndexMap<String, CodecValue>;

/// Value decoded from a ROS1 serialized payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecValue {
    // Boolean
    Bool(bool),

    // Signed integers
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),

    // Unsigned integers
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),

    // Floating point
    Float32(f32),
    Float64(f64),

    // String (UTF-8, lossy)
    String(String),

    // uint8[] / byte[] payloads
    Bytes(Vec<u8>),

    /// Timestamp as nanoseconds since Unix epoch
    Timestamp(i64),

    /// Duration as nanoseconds (can be negative)
    Duration(i64),

    // Array of values
    Array(Vec<CodecValue>),

    // Nested message/struct
    Struct(DecodedMessage),
}

impl CodecValue {
    /// Try to convert this value to f64 (for numeric values only).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CodecValue::Int8(v) => Some(*v as f64),
            CodecValue::Int16(v) => Some(*v as f64),
            CodecValue::Int32(v) => Some(*v as f64),
            CodecValue::Int64(v) => Some(*v as f64),
            CodecValue::UInt8(v) => Some(*v as f64),
            CodecValue::UInt16(v) => Some(*v as f64),
            CodecValue::UInt32(v) => Some(*v as f64),
            CodecValue::UInt64(v) => Some(*v as f64),
            CodecValue::Float32(v) => Some(*v as f64),
            CodecValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the nested struct, if this is one.
    pub fn as_struct(&self) -> Option<&DecodedMessage> {
        match self {
            CodecValue::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get the array elements, if this is an array.
    pub fn as_array(&self) -> Option<&[CodecValue]> {
        match self {
            CodecValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the timestamp in nanoseconds, if this is a timestamp.
    pub fn as_timestamp_nanos(&self) -> Option<i64> {
        match self {
            CodecValue::Timestamp(ns) => Some(*ns),
            _ => None,
        }
    }

    /// Interpret this value as a 2-D point.
    ///
    /// Matches any struct with numeric `x` and `y` members; other members
    /// (such as `z`) are ignored.
    pub fn as_point(&self) -> Option<[f64; 2]> {
        let fields = self.as_struct()?;
        let x = fields.get("x")?.as_f64()?;
        let y = fields.get("y")?.as_f64()?;
        Some([x, y])
    }

    /// Interpret this value as a sequence of 2-D points.
    ///
    /// Returns `None` unless every element is a point, so mixed or scalar
    /// arrays stay opaque. An empty array yields `Some(vec![])`.
    pub fn as_point_sequence(&self) -> Option<Vec<[f64; 2]>> {
        let items = self.as_array()?;
        items.iter().map(CodecValue::as_point).collect()
    }

    /// Create a ROS time value (`uint32 secs`, `uint32 nsecs`).
    pub fn from_ros1_time(secs: u32, nsecs: u32) -> Self {
        CodecValue::Timestamp(secs as i64 * 1_000_000_000 + nsecs as i64)
    }

    /// Create a ROS duration value (`int32 secs`, `int32 nsecs`).
    pub fn from_ros1_duration(secs: i32, nsecs: i32) -> Self {
        CodecValue::Duration(secs as i64 * 1_000_000_000 + nsecs as i64)
    }

    /// Get the type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            CodecValue::Bool(_) => "bool",
            CodecValue::Int8(_) => "int8",
            CodecValue::Int16(_) => "int16",
            CodecValue::Int32(_) => "int32",
            CodecValue::Int64(_) => "int64",
            CodecValue::UInt8(_) => "uint8",
            CodecValue::UInt16(_) => "uint16",
            CodecValue::UInt32(_) => "uint32",
            CodecValue::UInt64(_) => "uint64",
            CodecValue::Float32(_) => "float32",
            CodecValue::Float64(_) => "float64",
            CodecValue::String(_) => "string",
            CodecValue::Bytes(_) => "bytes",
            CodecValue::Timestamp(_) => "timestamp",
            CodecValue::Duration(_) => "duration",
            CodecValue::Array(_) => "array",
            CodecValue::Struct(_) => "struct",
        }
    }
}

impl fmt::Display for CodecValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecValue::Bool(v) => write!(f, "{v}"),
            CodecValue::Int8(v) => write!(f, "{v}"),
            CodecValue::Int16(v) => write!(f, "{v}"),
            CodecValue::Int32(v) => write!(f, "{v}"),
            CodecValue::Int64(v) => write!(f, "{v}"),
            CodecValue::UInt8(v) => write!(f, "{v}"),
            CodecValue::UInt16(v) => write!(f, "{v}"),
            CodecValue::UInt32(v) => write!(f, "{v}"),
            CodecValue::UInt64(v) => write!(f, "{v}"),
            CodecValue::Float32(v) => write!(f, "{v}"),
            CodecValue::Float64(v) => write!(f, "{v}"),
            CodecValue::String(s) => write!(f, "\"{s}\""),
            CodecValue::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            CodecValue::Timestamp(ns) => write!(f, "timestamp({ns})"),
            CodecValue::Duration(ns) => write!(f, "duration({ns})"),
            CodecValue::Array(items) => write!(f, "[{} items]", items.len()),
            CodecValue::Struct(fields) => write!(f, "{{{} fields}}", fields.len()),
        }
    }
}

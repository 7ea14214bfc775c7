// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 serialization of the messages the writer produces.

use crate::core::{ConvertError, Result};

/// Message type written by [`encode_polygon_stamped`].
pub const POLYGON_STAMPED_TYPE: &str = "geometry_msgs/PolygonStamped";

/// MD5 checksum of `geometry_msgs/PolygonStamped`.
pub const POLYGON_STAMPED_MD5: &str = "c6be8f7dc3bee7fe9e8d296070f53340";

/// Full message definition stored with PolygonStamped connections.
pub const POLYGON_STAMPED_DEFINITION: &str = "\
# This represents a Polygon with reference coordinate frame and timestamp
Header header
Polygon polygon

================================================================================
MSG: std_msgs/Header
# Standard metadata for higher-level stamped data types.
# This is generally used to communicate timestamped data
# in a particular coordinate frame.
#
# sequence ID: consecutively increasing ID
uint32 seq
#Two-integer timestamp that is expressed as:
# * stamp.sec: seconds (stamp_secs) since epoch (in Python the variable is called 'secs')
# * stamp.nsec: nanoseconds since stamp_secs (in Python the variable is called 'nsecs')
# time-handling sugar is provided by the client library
time stamp
#Frame this data is associated with
string frame_id

================================================================================
MSG: geometry_msgs/Polygon
#A specification of a polygon where the first and last points are assumed to be connected
Point32[] points

================================================================================
MSG: geometry_msgs/Point32
# This contains the position of a point in free space(with 32 bits of precision).
# It is recommeded to use Point wherever possible instead of Point32.
#
# This recommendation is to promote interoperability.
#
# This message is designed to take up less space when sending
# lots of points at once, as in the case of a PointCloud.

float32 x
float32 y
float32 z
";

/// Growable buffer of ROS1-serialized bytes.
#[derive(Debug, Default)]
pub struct Ros1Writer {
    buffer: Vec<u8>,
}

impl Ros1Writer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a u32.
    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append an f32.
    pub fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a length-prefixed string.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_len(value.len())?;
        self.buffer.extend_from_slice(value.as_bytes());
        Ok(())
    }

    /// Append a `time` value.
    pub fn write_time(&mut self, secs: u32, nsecs: u32) {
        self.write_u32(secs);
        self.write_u32(nsecs);
    }

    /// Append a dynamic-array length prefix.
    pub fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len).map_err(|_| {
            ConvertError::geometry(format!("sequence of {len} elements too long for ROS1"))
        })?;
        self.write_u32(len);
        Ok(())
    }

    /// Finish and return the serialized bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

/// Serialize a `geometry_msgs/PolygonStamped`.
///
/// `stamp` is `(secs, nsecs)`; each ring position becomes a `Point32` with
/// `z = 0`.
pub fn encode_polygon_stamped(
    seq: u32,
    stamp: (u32, u32),
    frame_id: &str,
    ring: &[[f64; 2]],
) -> Result<Vec<u8>> {
    let mut writer = Ros1Writer::new();

    // std_msgs/Header
    writer.write_u32(seq);
    writer.write_time(stamp.0, stamp.1);
    writer.write_string(frame_id)?;

    // geometry_msgs/Polygon
    writer.write_len(ring.len())?;
    for [x, y] in ring {
        writer.write_f32(*x as f32);
        writer.write_f32(*y as f32);
        writer.write_f32(0.0);
    }

    Ok(writer.into_inner())
}

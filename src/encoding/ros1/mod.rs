// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS1 message serialization.
//!
//! - [`cursor`] - bounds-checked little-endian reads
//! - [`decoder`] - schema-driven decoding into [`crate::core::DecodedMessage`]
//! - [`encoder`] - serialization of `geometry_msgs/PolygonStamped`

pub mod cursor;
pub mod decoder;
pub mod encoder;

pub use cursor::Ros1Cursor;
pub use decoder::Ros1Decoder;
pub use encoder::{
    encode_polygon_stamped, Ros1Writer, POLYGON_STAMPED_DEFINITION, POLYGON_STAMPED_MD5,
    POLYGON_STAMPED_TYPE,
};

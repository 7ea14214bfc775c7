// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # Robomap
//!
//! Map conversion for robotic mowers: polygon boundaries recorded in ROS1
//! bag files are extracted into GeoJSON, and GeoJSON polygons are written
//! back as a bag the robot stack can replay.
//!
//! ## Architecture
//!
//! - `io/formats/bag/` - record reader, demultiplexer and writer for `#ROSBAG V2.0`
//! - `io/filter` - topic selection
//! - `schema/` - ROS1 `.msg` definition parsing
//! - `encoding/ros1/` - ROS1 payload decoding and `PolygonStamped` encoding
//! - `extract/` - point fields and timestamps from decoded payloads
//! - `geo/` - GeoJSON model and ring normalization
//! - `convert/` - the two conversion pipelines
//!
//! ## Example: Bag to GeoJSON
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::Path;
//! use robomap::config::ExtractConfig;
//!
//! let stats = robomap::bag_to_geojson(
//!     Path::new("mower.bag"),
//!     Path::new("map.geojson"),
//!     &ExtractConfig::default(),
//! )?;
//! println!("{stats}");
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{CodecValue, ConvertError, DecodedMessage, Result};

// Encoding/decoding
pub mod encoding;

// Schema parsing
pub mod schema;

// Container I/O
pub mod io;

pub use io::{BagReader, BagWriter, Demultiplexer, TopicFilter};

// Geometry and extraction
pub mod extract;
pub mod geo;

pub use extract::{PayloadExtractor, PointField, Stamp, StampSource};
pub use geo::{Feature, FeatureCollection, Geometry};

// Configuration
pub mod config;

pub use config::{ConvertConfig, ExtractConfig, WriteConfig};

// Pipelines
pub mod convert;

pub use convert::{bag_to_geojson, geojson_to_bag, inspect_bag, ConvertStats};

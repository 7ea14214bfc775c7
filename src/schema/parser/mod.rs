// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema parser implementations.

pub mod msg_parser;

use crate::core::Result;
use crate::schema::{builtin_types, MessageSchema};

/// Parse a ROS1 message definition.
///
/// # Arguments
///
/// * `name` - Message type (e.g., "geometry_msgs/PolygonStamped")
/// * `definition` - Full `message_definition` text of the connection
///
/// # Returns
///
/// Parsed `MessageSchema`. An empty definition falls back to the builtin
/// types when `name` is one of them. Builtin types the definition does not
/// declare are added so bare references to them still resolve.
pub fn parse_schema(name: &str, definition: &str) -> Result<MessageSchema> {
    if definition.trim().is_empty() {
        if let Some(schema) = builtin_types::schema_for(name) {
            return Ok(schema);
        }
    }

    let mut schema = msg_parser::parse(name, definition)?;
    builtin_types::fill_missing(&mut schema);
    Ok(schema)
}

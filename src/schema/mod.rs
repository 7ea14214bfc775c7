// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema parsing for ROS1 `.msg` definitions.

pub mod ast;
pub mod builtin_types;
pub mod parser;

pub use ast::{Field, FieldType, MessageSchema, MessageType, PrimitiveType};
pub use parser::{msg_parser, parse_schema};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_definition_uses_builtin() {
        let schema = parse_schema("geometry_msgs/PolygonStamped", "").unwrap();
        let root = schema.root().unwrap();
        assert_eq!(root.fields[0].name, "header");
        assert_eq!(root.fields[1].name, "polygon");
    }

    #[test]
    fn test_empty_definition_for_unknown_type() {
        let schema = parse_schema("custom/Empty", "  \n").unwrap();
        assert!(schema.root().unwrap().fields.is_empty());
    }

    #[test]
    fn test_short_definition_resolves_against_builtins() {
        // Some recorders store only the root block.
        let schema = parse_schema("geometry_msgs/PolygonStamped", "Header header\nPolygon polygon\n")
            .unwrap();
        let from = "geometry_msgs/PolygonStamped";
        assert!(schema.resolve("Header", from).is_some());
        assert!(schema.resolve("Polygon", from).is_some());
    }

    #[test]
    fn test_declared_types_win_over_builtins() {
        let def = "Header header\n===\nMSG: std_msgs/Header\ntime stamp\nstring frame_id\n";
        let schema = parse_schema("custom/Stamped", def).unwrap();
        assert_eq!(schema.get_type("std_msgs/Header").unwrap().fields.len(), 2);
    }
}

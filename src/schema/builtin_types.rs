// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Predefined ROS1 message types.
//!
//! Some recorders store connections with an empty `message_definition`.
//! The types below cover the polygon messages the mower publishes, so those
//! connections still decode.
//!
//! ## Supported Types
//!
//! - `std_msgs/Header` - `uint32 seq`, `time stamp`, `string frame_id`
//! - `geometry_msgs/Point` - `float64 x, y, z`
//! - `geometry_msgs/Point32` - `float32 x, y, z`
//! - `geometry_msgs/Polygon` - `Point32[] points`
//! - `geometry_msgs/PolygonStamped` - `Header header`, `Polygon polygon`

use crate::schema::ast::{Field, FieldType, MessageSchema, MessageType, PrimitiveType};

fn primitive(name: &str, prim: PrimitiveType) -> Field {
    Field {
        name: name.to_string(),
        type_name: FieldType::Primitive(prim),
    }
}

fn nested(name: &str, type_name: &str) -> Field {
    Field {
        name: name.to_string(),
        type_name: FieldType::Nested(type_name.to_string()),
    }
}

/// Create the predefined std_msgs/Header type (ROS1 layout, with `seq`).
fn builtin_header() -> MessageType {
    let mut msg_type = MessageType::new("std_msgs/Header".to_string());
    msg_type.add_field(primitive("seq", PrimitiveType::UInt32));
    msg_type.add_field(primitive("stamp", PrimitiveType::Time));
    msg_type.add_field(primitive("frame_id", PrimitiveType::String));
    msg_type
}

fn xyz(type_name: &str, prim: PrimitiveType) -> MessageType {
    let mut msg_type = MessageType::new(type_name.to_string());
    msg_type.add_field(primitive("x", prim));
    msg_type.add_field(primitive("y", prim));
    msg_type.add_field(primitive("z", prim));
    msg_type
}

fn builtin_polygon() -> MessageType {
    let mut msg_type = MessageType::new("geometry_msgs/Polygon".to_string());
    msg_type.add_field(Field {
        name: "points".to_string(),
        type_name: FieldType::Array {
            base_type: Box::new(FieldType::Nested("geometry_msgs/Point32".to_string())),
            size: None,
        },
    });
    msg_type
}

fn builtin_polygon_stamped() -> MessageType {
    let mut msg_type = MessageType::new("geometry_msgs/PolygonStamped".to_string());
    msg_type.add_field(nested("header", "std_msgs/Header"));
    msg_type.add_field(nested("polygon", "geometry_msgs/Polygon"));
    msg_type
}

/// Get all predefined builtin message types.
pub fn get_all() -> Vec<MessageType> {
    vec![
        builtin_header(),
        xyz("geometry_msgs/Point", PrimitiveType::Float64),
        xyz("geometry_msgs/Point32", PrimitiveType::Float32),
        builtin_polygon(),
        builtin_polygon_stamped(),
    ]
}

/// Build a schema for `type_name` purely from builtins.
///
/// Returns `None` when the type is not one of the builtins.
pub fn schema_for(type_name: &str) -> Option<MessageSchema> {
    let all = get_all();
    if !all.iter().any(|t| t.name == type_name) {
        return None;
    }
    let mut schema = MessageSchema::new(type_name.to_string());
    for msg_type in all {
        schema.add_type(msg_type);
    }
    Some(schema)
}

/// Add every builtin type the schema does not define itself.
pub fn fill_missing(schema: &mut MessageSchema) {
    for msg_type in get_all() {
        if !schema.types.contains_key(&msg_type.name) {
            schema.add_type(msg_type);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_header_structure() {
        let header = builtin_header();

        assert_eq!(header.name, "std_msgs/Header");
        let names: Vec<&str> = header.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["seq", "stamp", "frame_id"]);
        assert!(matches!(
            header.fields[1].type_name,
            FieldType::Primitive(PrimitiveType::Time)
        ));
    }

    #[test]
    fn test_point_types_differ_in_precision() {
        let all = get_all();
        let point = all.iter().find(|t| t.name == "geometry_msgs/Point").unwrap();
        let point32 = all
            .iter()
            .find(|t| t.name == "geometry_msgs/Point32")
            .unwrap();

        assert!(matches!(
            point.fields[0].type_name,
            FieldType::Primitive(PrimitiveType::Float64)
        ));
        assert!(matches!(
            point32.fields[0].type_name,
            FieldType::Primitive(PrimitiveType::Float32)
        ));
    }

    #[test]
    fn test_schema_for_polygon_stamped() {
        let schema = schema_for("geometry_msgs/PolygonStamped").unwrap();
        let root = schema.root().unwrap();
        assert_eq!(root.fields.len(), 2);
        assert!(schema.get_type("geometry_msgs/Point32").is_some());

        assert!(schema_for("nav_msgs/OccupancyGrid").is_none());
    }

    #[test]
    fn test_fill_missing_keeps_existing_types() {
        let mut schema = MessageSchema::new("custom/Map".to_string());
        let mut header = MessageType::new("std_msgs/Header".to_string());
        header.add_field(primitive("stamp", PrimitiveType::Time));
        schema.add_type(header);

        fill_missing(&mut schema);

        assert_eq!(schema.get_type("std_msgs/Header").unwrap().fields.len(), 1);
        assert!(schema.get_type("geometry_msgs/Polygon").is_some());
    }
}

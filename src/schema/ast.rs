// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! AST types for parsed ROS .msg schemas.

use std::collections::HashMap;

/// A parsed ROS message schema.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    /// Schema name (e.g., "geometry_msgs/PolygonStamped")
    pub name: String,
    /// Package name (e.g., "geometry_msgs")
    pub package: Option<String>,
    /// All types defined in this schema (main type + nested types)
    pub types: HashMap<String, MessageType>,
}

/// A message type definition with its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageType {
    /// Type name including package if available
    pub name: String,
    /// Ordered list of fields
    pub fields: Vec<Field>,
}

/// A field in a message type.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    pub type_name: FieldType,
}

/// Field type - can be primitive, array, or nested message.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Primitive type
    Primitive(PrimitiveType),
    /// Array type
    Array {
        /// Base type (element type)
        base_type: Box<FieldType>,
        /// Array size (None = dynamic, Some(N) = fixed)
        size: Option<usize>,
    },
    /// Nested message type, as written in the definition
    Nested(String),
}

/// Primitive ROS1 types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// Boolean
    Bool,
    /// 8-bit signed integer
    Int8,
    /// 16-bit signed integer
    Int16,
    /// 32-bit signed integer
    Int32,
    /// 64-bit signed integer
    Int64,
    /// 8-bit unsigned integer
    UInt8,
    /// 16-bit unsigned integer
    UInt16,
    /// 32-bit unsigned integer
    UInt32,
    /// 64-bit unsigned integer
    UInt64,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// String
    String,
    /// Byte (deprecated alias for int8 in ROS1, decoded as uint8)
    Byte,
    /// Char (deprecated alias for uint8 in ROS1)
    Char,
    /// Time (uint32 secs, uint32 nsecs)
    Time,
    /// Duration (int32 secs, int32 nsecs)
    Duration,
}

impl PrimitiveType {
    /// Get the serialized size in bytes, if fixed.
    pub fn size(self) -> Option<usize> {
        match self {
            PrimitiveType::Bool
            | PrimitiveType::Int8
            | PrimitiveType::UInt8
            | PrimitiveType::Byte
            | PrimitiveType::Char => Some(1),
            PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 | PrimitiveType::Float32 => Some(4),
            PrimitiveType::Int64 | PrimitiveType::UInt64 | PrimitiveType::Float64 => Some(8),
            PrimitiveType::String => None,
            PrimitiveType::Time | PrimitiveType::Duration => Some(8),
        }
    }

    /// Integer and floating-point types.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            PrimitiveType::Int8
                | PrimitiveType::Int16
                | PrimitiveType::Int32
                | PrimitiveType::Int64
                | PrimitiveType::UInt8
                | PrimitiveType::UInt16
                | PrimitiveType::UInt32
                | PrimitiveType::UInt64
                | PrimitiveType::Float32
                | PrimitiveType::Float64
        )
    }

    /// Parse a primitive type from a string.
    pub fn try_from_str(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(PrimitiveType::Bool),
            "int8" => Some(PrimitiveType::Int8),
            "int16" => Some(PrimitiveType::Int16),
            "int32" => Some(PrimitiveType::Int32),
            "int64" => Some(PrimitiveType::Int64),
            "uint8" => Some(PrimitiveType::UInt8),
            "uint16" => Some(PrimitiveType::UInt16),
            "uint32" => Some(PrimitiveType::UInt32),
            "uint64" => Some(PrimitiveType::UInt64),
            "float32" => Some(PrimitiveType::Float32),
            "float64" => Some(PrimitiveType::Float64),
            "string" => Some(PrimitiveType::String),
            "byte" => Some(PrimitiveType::Byte),
            "char" => Some(PrimitiveType::Char),
            "time" => Some(PrimitiveType::Time),
            "duration" => Some(PrimitiveType::Duration),
            _ => None,
        }
    }
}

impl FieldType {
    /// Lower bound of the serialized size of one value of this type.
    ///
    /// Used to reject array counts that cannot possibly fit the remaining
    /// payload before allocating.
    pub fn min_size(&self) -> usize {
        match self {
            FieldType::Primitive(p) => p.size().unwrap_or(4),
            FieldType::Array { base_type, size } => match size {
                Some(n) => n * base_type.min_size(),
                None => 4,
            },
            FieldType::Nested(_) => 0,
        }
    }
}

impl MessageSchema {
    /// Create an empty schema.
    pub fn new(name: String) -> Self {
        Self {
            package: extract_package(&name),
            name,
            types: HashMap::new(),
        }
    }

    /// Register a type in this schema.
    pub fn add_type(&mut self, msg_type: MessageType) {
        self.types.insert(msg_type.name.clone(), msg_type);
    }

    /// Look up a type by name.
    pub fn get_type(&self, name: &str) -> Option<&MessageType> {
        self.types.get(name)
    }

    /// The root message type.
    pub fn root(&self) -> Option<&MessageType> {
        self.types.get(&self.name)
    }

    /// Resolve a nested type reference made from inside `from_type`.
    ///
    /// ROS1 resolution order: exact name, bare `Header` as
    /// `std_msgs/Header`, the referencing type's own package, then a unique
    /// short-name match.
    pub fn resolve(&self, reference: &str, from_type: &str) -> Option<&MessageType> {
        if let Some(t) = self.types.get(reference) {
            return Some(t);
        }

        if reference.contains('/') {
            // Fully qualified names only fall back to their short name.
            let short = reference.rsplit('/').next().unwrap_or(reference);
            return self.find_unique_short_name(short);
        }

        if reference == "Header" {
            if let Some(t) = self.types.get("std_msgs/Header") {
                return Some(t);
            }
        }

        if let Some(package) = extract_package(from_type) {
            if let Some(t) = self.types.get(&format!("{package}/{reference}")) {
                return Some(t);
            }
        }

        self.find_unique_short_name(reference)
    }

    fn find_unique_short_name(&self, short: &str) -> Option<&MessageType> {
        let suffix = format!("/{short}");
        let mut matches = self
            .types
            .iter()
            .filter(|(name, _)| name.ends_with(&suffix) || name.as_str() == short)
            .map(|(_, t)| t);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }
}

impl MessageType {
    /// Create a new message type.
    pub fn new(name: String) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Add a field to this message type.
    pub fn add_field(&mut self, field: Field) {
        self.fields.push(field);
    }
}

/// Extract package name from a fully-qualified type name.
fn extract_package(name: &str) -> Option<String> {
    let (package, rest) = name.split_once('/')?;
    if package.is_empty() || rest.is_empty() {
        None
    } else {
        Some(package.to_string())
    }
}

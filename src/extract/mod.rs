// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Point-field extraction from matched bag messages.
//!
//! The payload is decoded into a generic [`DecodedMessage`] using the
//! connection's own message definition, then walked for arrays whose
//! elements all look like points (numeric `x` and `y`). Each such array is
//! a [`PointField`] named by its dotted path, e.g. `polygon.points` or
//! `obstacles[1].points`.

pub mod stamp;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::{CodecValue, ConvertError, DecodedMessage, Result};
use crate::encoding::Ros1Decoder;
use crate::io::formats::bag::MatchedMessage;
use crate::schema::{parse_schema, FieldType, MessageSchema, MessageType};

pub use stamp::{Stamp, StampSource};

/// One point sequence found in a message. May be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct PointField {
    /// Dotted path of the field within the message
    pub path: String,
    /// Points in message order
    pub points: Vec<[f64; 2]>,
}

impl PointField {
    /// Reject NaN or infinite coordinates, which GeoJSON cannot carry.
    pub fn check_finite(&self) -> Result<()> {
        match self
            .points
            .iter()
            .position(|[x, y]| !x.is_finite() || !y.is_finite())
        {
            Some(i) => Err(ConvertError::decode(
                &self.path,
                format!("non-finite coordinate at point {i}"),
            )),
            None => Ok(()),
        }
    }
}

/// Everything extracted from one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub fields: Vec<PointField>,
    pub stamp: Stamp,
}

/// Decodes payloads and pulls out point fields.
///
/// Schemas are parsed once per connection id. A definition that fails to
/// parse is remembered, so later messages on that connection fail fast with
/// the same error.
#[derive(Debug, Default)]
pub struct PayloadExtractor {
    decoder: Ros1Decoder,
    schemas: HashMap<u32, std::result::Result<Arc<MessageSchema>, ConvertError>>,
    /// When non-empty, only fields matching one of these names are emitted
    point_fields: Vec<String>,
}

impl PayloadExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict emitted fields.
    ///
    /// A name matches a field when it equals the full path, the path with
    /// array indices removed (`obstacles.points`), or the last segment
    /// (`points`).
    pub fn with_point_fields(mut self, names: Vec<String>) -> Self {
        self.point_fields = names;
        self
    }

    /// Number of connections whose definition could not be parsed.
    pub fn schema_failures(&self) -> usize {
        self.schemas.values().filter(|s| s.is_err()).count()
    }

    /// Decode one message and extract its point fields.
    ///
    /// Errors are recoverable (see [`ConvertError::is_recoverable`]): the
    /// caller skips the message and keeps going.
    pub fn extract(&mut self, message: &MatchedMessage) -> Result<Extraction> {
        let schema = self.schema_for(message)?;
        let decoded = self.decoder.decode(&schema, &message.data)?;

        let mut fields = Vec::new();
        collect_points(&schema, schema.root(), &decoded, "", &mut fields);
        if !self.point_fields.is_empty() {
            fields.retain(|field| self.wants(&field.path));
        }

        Ok(Extraction {
            fields,
            stamp: Stamp::resolve(&decoded, message.time),
        })
    }

    fn schema_for(&mut self, message: &MatchedMessage) -> Result<Arc<MessageSchema>> {
        let connection = &message.connection;
        let cached = self.schemas.entry(connection.conn_id).or_insert_with(|| {
            match parse_schema(&connection.message_type, &connection.message_definition) {
                Ok(schema) => {
                    debug!(
                        conn = connection.conn_id,
                        message_type = %connection.message_type,
                        types = schema.types.len(),
                        "parsed message definition"
                    );
                    Ok(Arc::new(schema))
                }
                Err(e) => {
                    warn!(
                        conn = connection.conn_id,
                        topic = %connection.topic,
                        error = %e,
                        "unusable message definition, skipping its messages"
                    );
                    Err(e)
                }
            }
        });
        cached.clone()
    }

    fn wants(&self, path: &str) -> bool {
        let unindexed = strip_indices(path);
        let last = path.rsplit('.').next().unwrap_or(path);
        self.point_fields
            .iter()
            .any(|name| name == path || *name == unindexed || name == last)
    }
}

/// Walk a decoded struct of type `owner`, appending point sequences in
/// field order.
fn collect_points<'s>(
    schema: &'s MessageSchema,
    owner: Option<&'s MessageType>,
    fields: &DecodedMessage,
    prefix: &str,
    out: &mut Vec<PointField>,
) {
    for (name, value) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{prefix}.{name}")
        };
        let field_type = owner
            .and_then(|t| t.fields.iter().find(|f| f.name == *name))
            .map(|f| &f.type_name);
        collect_value(schema, owner, field_type, value, path, out);
    }
}

fn collect_value<'s>(
    schema: &'s MessageSchema,
    owner: Option<&'s MessageType>,
    field_type: Option<&FieldType>,
    value: &CodecValue,
    path: String,
    out: &mut Vec<PointField>,
) {
    match value {
        CodecValue::Struct(fields) => {
            let nested = nested_type(schema, owner, field_type);
            collect_points(schema, nested, fields, &path, out);
        }
        CodecValue::Array(items) => {
            let element = match field_type {
                Some(FieldType::Array { base_type, .. }) => Some(base_type.as_ref()),
                _ => None,
            };
            // an empty array is a point field only when its element type is
            if items.is_empty() {
                if is_point_type(schema, owner, element) {
                    out.push(PointField {
                        path,
                        points: Vec::new(),
                    });
                }
                return;
            }
            if let Some(points) = value.as_point_sequence() {
                out.push(PointField { path, points });
                return;
            }
            let nested = nested_type(schema, owner, element);
            for (i, item) in items.iter().enumerate() {
                if let CodecValue::Struct(fields) = item {
                    collect_points(schema, nested, fields, &format!("{path}[{i}]"), out);
                }
            }
        }
        _ => {}
    }
}

fn nested_type<'s>(
    schema: &'s MessageSchema,
    owner: Option<&'s MessageType>,
    field_type: Option<&FieldType>,
) -> Option<&'s MessageType> {
    match (owner, field_type) {
        (Some(owner), Some(FieldType::Nested(name))) => schema.resolve(name, &owner.name),
        _ => None,
    }
}

/// A message type with numeric `x` and `y` fields.
fn is_point_type(
    schema: &MessageSchema,
    owner: Option<&MessageType>,
    element: Option<&FieldType>,
) -> bool {
    let Some(point) = nested_type(schema, owner, element) else {
        return false;
    };
    ["x", "y"].iter().all(|axis| {
        point.fields.iter().any(|f| {
            f.name == *axis && matches!(f.type_name, FieldType::Primitive(p) if p.is_numeric())
        })
    })
}

fn strip_indices(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut in_index = false;
    for c in path.chars() {
        match c {
            '[' => in_index = true,
            ']' => in_index = false,
            _ if !in_index => out.push(c),
            _ => {}
        }
    }
    out
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema-driven ROS1 payload decoder.
//!
//! Walks a [`MessageSchema`] field by field and produces a [`DecodedMessage`]
//! whose keys follow schema order.

use tracing::debug;

use crate::core::{CodecValue, ConvertError, DecodedMessage, Result};
use crate::schema::{FieldType, MessageSchema, MessageType, PrimitiveType};

use super::cursor::Ros1Cursor;

/// Maximum nesting depth of message types.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Decoder for ROS1-serialized message payloads.
///
/// Stateless; schemas are parsed and cached by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct Ros1Decoder;

impl Ros1Decoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self
    }

    /// Decode `data` as an instance of the schema's root type.
    pub fn decode(&self, schema: &MessageSchema, data: &[u8]) -> Result<DecodedMessage> {
        let root = schema.root().ok_or_else(|| {
            ConvertError::invalid_schema(&schema.name, "root type missing from schema")
        })?;

        let mut cursor = Ros1Cursor::new(data);
        let fields = self.read_struct(&mut cursor, root, schema, 0)?;

        if !cursor.is_at_end() {
            debug!(
                schema = %schema.name,
                trailing = cursor.remaining(),
                "payload longer than its schema"
            );
        }

        Ok(fields)
    }

    fn read_struct(
        &self,
        cursor: &mut Ros1Cursor,
        msg_type: &MessageType,
        schema: &MessageSchema,
        depth: usize,
    ) -> Result<DecodedMessage> {
        if depth > MAX_NESTING_DEPTH {
            return Err(ConvertError::decode(
                &schema.name,
                format!("nesting deeper than {MAX_NESTING_DEPTH} at {}", msg_type.name),
            ));
        }

        let mut fields = DecodedMessage::with_capacity(msg_type.fields.len());
        for field in &msg_type.fields {
            let value = self.read_value(cursor, &field.type_name, msg_type, schema, depth)?;
            fields.insert(field.name.clone(), value);
        }
        Ok(fields)
    }

    fn read_value(
        &self,
        cursor: &mut Ros1Cursor,
        field_type: &FieldType,
        owner: &MessageType,
        schema: &MessageSchema,
        depth: usize,
    ) -> Result<CodecValue> {
        match field_type {
            FieldType::Primitive(prim) => self.read_primitive(cursor, *prim),
            FieldType::Nested(name) => {
                let nested = resolve(schema, name, owner)?;
                Ok(CodecValue::Struct(self.read_struct(
                    cursor,
                    nested,
                    schema,
                    depth + 1,
                )?))
            }
            FieldType::Array { base_type, size } => {
                self.read_array(cursor, base_type, *size, owner, schema, depth)
            }
        }
    }

    fn read_array(
        &self,
        cursor: &mut Ros1Cursor,
        element: &FieldType,
        fixed_count: Option<usize>,
        owner: &MessageType,
        schema: &MessageSchema,
        depth: usize,
    ) -> Result<CodecValue> {
        let elem_size = min_wire_size(element, owner, schema, depth)?;

        let count = match fixed_count {
            Some(n) => {
                let needed = n.saturating_mul(elem_size.max(1));
                if needed > cursor.remaining() {
                    return Err(ConvertError::length_exceeded(
                        n,
                        cursor.position(),
                        cursor.len(),
                    ));
                }
                n
            }
            None => cursor.read_count(elem_size)?,
        };

        // uint8[] and byte[] carry opaque blobs
        if let FieldType::Primitive(
            PrimitiveType::UInt8 | PrimitiveType::Byte | PrimitiveType::Char,
        ) = element
        {
            return Ok(CodecValue::Bytes(cursor.read_bytes(count)?.to_vec()));
        }

        let mut values = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            values.push(self.read_value(cursor, element, owner, schema, depth)?);
        }
        Ok(CodecValue::Array(values))
    }

    fn read_primitive(&self, cursor: &mut Ros1Cursor, prim: PrimitiveType) -> Result<CodecValue> {
        Ok(match prim {
            PrimitiveType::Bool => CodecValue::Bool(cursor.read_u8()? != 0),
            PrimitiveType::Int8 => CodecValue::Int8(cursor.read_i8()?),
            PrimitiveType::Int16 => CodecValue::Int16(cursor.read_i16()?),
            PrimitiveType::Int32 => CodecValue::Int32(cursor.read_i32()?),
            PrimitiveType::Int64 => CodecValue::Int64(cursor.read_i64()?),
            PrimitiveType::UInt8 | PrimitiveType::Byte | PrimitiveType::Char => {
                CodecValue::UInt8(cursor.read_u8()?)
            }
            PrimitiveType::UInt16 => CodecValue::UInt16(cursor.read_u16()?),
            PrimitiveType::UInt32 => CodecValue::UInt32(cursor.read_u32()?),
            PrimitiveType::UInt64 => CodecValue::UInt64(cursor.read_u64()?),
            PrimitiveType::Float32 => CodecValue::Float32(cursor.read_f32()?),
            PrimitiveType::Float64 => CodecValue::Float64(cursor.read_f64()?),
            PrimitiveType::String => {
                let len = cursor.read_count(1)?;
                let bytes = cursor.read_bytes(len)?;
                CodecValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
            PrimitiveType::Time => {
                let secs = cursor.read_u32()?;
                let nsecs = cursor.read_u32()?;
                CodecValue::from_ros1_time(secs, nsecs)
            }
            PrimitiveType::Duration => {
                let secs = cursor.read_i32()?;
                let nsecs = cursor.read_i32()?;
                CodecValue::from_ros1_duration(secs, nsecs)
            }
        })
    }
}

fn resolve<'s>(
    schema: &'s MessageSchema,
    name: &str,
    owner: &MessageType,
) -> Result<&'s MessageType> {
    schema.resolve(name, &owner.name).ok_or_else(|| {
        ConvertError::invalid_schema(
            &schema.name,
            format!("unresolved type '{name}' referenced from {}", owner.name),
        )
    })
}

/// Smallest number of bytes one value of `field_type` can occupy.
fn min_wire_size(
    field_type: &FieldType,
    owner: &MessageType,
    schema: &MessageSchema,
    depth: usize,
) -> Result<usize> {
    match field_type {
        FieldType::Nested(name) => {
            if depth > MAX_NESTING_DEPTH {
                return Err(ConvertError::decode(
                    &schema.name,
                    format!("nesting deeper than {MAX_NESTING_DEPTH} at {name}"),
                ));
            }
            let nested = resolve(schema, name, owner)?;
            let mut total = 0usize;
            for field in &nested.fields {
                total = total.saturating_add(min_wire_size(
                    &field.type_name,
                    nested,
                    schema,
                    depth + 1,
                )?);
            }
            Ok(total)
        }
        FieldType::Array {
            base_type,
            size: Some(n),
        } => Ok(n.saturating_mul(min_wire_size(base_type, owner, schema, depth)?)),
        other => Ok(other.min_size()),
    }
}

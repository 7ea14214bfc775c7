// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! MSG format parser using Pest.
//!
//! Handles the ROS1 `.msg` text embedded in bag connection records:
//! - Simple field lists (root message)
//! - Dependency blocks with "MSG: TypeName" headers after `===` lines
//! - Array types: T[] (dynamic) or T[n] (fixed)
//! - Nested types: package/MessageName or bare MessageName
//! - Constants (`TYPE NAME=value`), which carry no payload bytes
//! - Comments (# style)

use crate::core::{ConvertError, Result};
use crate::schema::ast::{Field, FieldType, MessageSchema, MessageType, PrimitiveType};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

/// Pest parser for ROS .msg schema files.
#[derive(Parser)]
#[grammar = "schema/parser/msg_parser/msg.pest"] // Path relative to src/ directory
pub struct MsgParser;

/// Parse a ROS1 `.msg` definition for the message type `name`.
pub fn parse(name: &str, definition: &str) -> Result<MessageSchema> {
    let mut text = definition.to_string();
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let pairs = MsgParser::parse(Rule::schema, &text)
        .map_err(|e| ConvertError::invalid_schema(name, e.to_string()))?;

    let mut schema = MessageSchema::new(name.to_string());

    for pair in pairs {
        // schema = SOI ~ root_msg ~ (separator ~ dependency_msg)* ~ EOI
        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::root_msg => {
                    let mut msg_type = MessageType::new(name.to_string());
                    for field in item.into_inner().filter_map(parse_field) {
                        msg_type.add_field(field);
                    }
                    schema.add_type(msg_type);
                }
                Rule::dependency_msg => {
                    let msg_type = parse_dependency(item)?;
                    schema.add_type(msg_type);
                }
                _ => {}
            }
        }
    }

    Ok(schema)
}

/// dependency_msg = { blank_line* ~ dependency_header ~ line* }
fn parse_dependency(pair: Pair<Rule>) -> Result<MessageType> {
    let mut inner = pair
        .into_inner()
        .skip_while(|p| p.as_rule() != Rule::dependency_header);

    // Leading comment pairs come from blank lines before the header.
    let type_name = inner
        .next()
        .and_then(|header| {
            header
                .into_inner()
                .find(|p| p.as_rule() == Rule::type_name)
        })
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| ConvertError::invalid_schema("MSG:", "dependency block without type"))?;

    let mut msg_type = MessageType::new(type_name);
    for field in inner.filter_map(parse_field) {
        msg_type.add_field(field);
    }
    Ok(msg_type)
}

/// Turn a `field` pair into a [`Field`]. Constants and comments yield `None`.
fn parse_field(pair: Pair<Rule>) -> Option<Field> {
    if pair.as_rule() != Rule::field {
        return None;
    }

    let mut inner = pair.into_inner();
    let field_type = inner.next()?;
    let field_name = inner.next()?.as_str().to_string();

    Some(Field {
        name: field_name,
        type_name: build_field_type(field_type)?,
    })
}

/// field_type = ${ type_name ~ array_suffix? }
fn build_field_type(pair: Pair<Rule>) -> Option<FieldType> {
    let mut inner = pair.into_inner();
    let base_type_str = inner.next()?.as_str();

    let base = match PrimitiveType::try_from_str(base_type_str) {
        Some(prim) => FieldType::Primitive(prim),
        None => FieldType::Nested(base_type_str.to_string()),
    };

    match inner.next() {
        Some(suffix) => {
            let size = suffix
                .into_inner()
                .next()
                .and_then(|digits| digits.as_str().parse().ok());
            Some(FieldType::Array {
                base_type: Box::new(base),
                size,
            })
        }
        None => Some(base),
    }
}

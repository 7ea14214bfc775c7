// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for robomap.
//!
//! Errors fall into two classes:
//! - fatal: container framing, conflicting connections, I/O, configuration
//! - recoverable: one record or one feature is skipped and counted
//!
//! See [`ConvertError::is_recoverable`].

use std::fmt;

/// Errors that can occur while converting between bags and GeoJSON.
#[derive(Debug, Clone)]
pub enum ConvertError {
    /// Corrupt or truncated container framing
    Framing {
        /// Stream being read (e.g., "bag", "chunk@4117")
        context: String,
        /// Byte offset of the offending record within the stream
        offset: u64,
        /// Index of the offending record within the stream
        record: u64,
        /// Error message
        message: String,
    },

    /// A connection id was registered twice with different topic, type or md5sum
    Schema {
        /// Connection ID
        conn_id: u32,
        /// Error message
        message: String,
    },

    /// Message definition could not be parsed
    InvalidSchema {
        /// Schema name or identifier
        schema_name: String,
        /// Validation error message
        reason: String,
    },

    /// Malformed payload in a single record
    Decode {
        /// What was being decoded
        context: String,
        /// Error message
        message: String,
    },

    /// Buffer too short for requested read
    BufferTooShort {
        /// Requested bytes
        requested: usize,
        /// Available bytes
        available: usize,
        /// Cursor position when error occurred
        cursor_pos: u64,
    },

    /// Array or sequence length exceeded data bounds
    LengthExceeded {
        /// Length that was read
        length: usize,
        /// Position in buffer
        position: usize,
        /// Buffer length
        buffer_len: usize,
    },

    /// A feature could not be turned into (or from) a polygon
    Geometry {
        /// Error message
        message: String,
    },

    /// I/O failure on an input or output file
    Io {
        /// Operation context
        context: String,
        /// Error message
        message: String,
    },

    /// GeoJSON document could not be read or written
    Json {
        /// Error message
        message: String,
    },

    /// Invalid configuration
    Config {
        /// Error message
        message: String,
    },

    /// Unsupported feature of the container format
    Unsupported {
        /// What is not supported
        feature: String,
    },
}

impl ConvertError {
    /// Create a framing error.
    pub fn framing(
        context: impl Into<String>,
        offset: u64,
        record: u64,
        message: impl Into<String>,
    ) -> Self {
        ConvertError::Framing {
            context: context.into(),
            offset,
            record,
            message: message.into(),
        }
    }

    /// Create a schema (conflicting connection) error.
    pub fn schema(conn_id: u32, message: impl Into<String>) -> Self {
        ConvertError::Schema {
            conn_id,
            message: message.into(),
        }
    }

    /// Create an invalid schema error.
    pub fn invalid_schema(schema_name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConvertError::InvalidSchema {
            schema_name: schema_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(context: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Decode {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a buffer too short error.
    pub fn buffer_too_short(requested: usize, available: usize, cursor_pos: u64) -> Self {
        ConvertError::BufferTooShort {
            requested,
            available,
            cursor_pos,
        }
    }

    /// Create a length exceeded error.
    pub fn length_exceeded(length: usize, position: usize, buffer_len: usize) -> Self {
        ConvertError::LengthExceeded {
            length,
            position,
            buffer_len,
        }
    }

    /// Create a geometry error.
    pub fn geometry(message: impl Into<String>) -> Self {
        ConvertError::Geometry {
            message: message.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::Io {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ConvertError::Config {
            message: message.into(),
        }
    }

    /// Create an unsupported feature error.
    pub fn unsupported(feature: impl Into<String>) -> Self {
        ConvertError::Unsupported {
            feature: feature.into(),
        }
    }

    /// Whether the run may continue after this error by skipping one
    /// record or feature.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ConvertError::InvalidSchema { .. }
                | ConvertError::Decode { .. }
                | ConvertError::BufferTooShort { .. }
                | ConvertError::LengthExceeded { .. }
                | ConvertError::Geometry { .. }
        )
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::Framing {
                context,
                offset,
                record,
                message,
            } => write!(
                f,
                "Framing error in {context} at byte {offset} (record {record}): {message}"
            ),
            ConvertError::Schema { conn_id, message } => {
                write!(f, "Conflicting connection {conn_id}: {message}")
            }
            ConvertError::InvalidSchema {
                schema_name,
                reason,
            } => {
                write!(f, "Invalid schema '{schema_name}': {reason}")
            }
            ConvertError::Decode { context, message } => {
                write!(f, "Decode error in {context}: {message}")
            }
            ConvertError::BufferTooShort {
                requested,
                available,
                cursor_pos,
            } => write!(
                f,
                "Buffer too short: requested {requested} bytes at position {cursor_pos}, but only {available} bytes available"
            ),
            ConvertError::LengthExceeded {
                length,
                position,
                buffer_len,
            } => write!(
                f,
                "Length {length} exceeds buffer at position {position} (buffer length: {buffer_len})"
            ),
            ConvertError::Geometry { message } => write!(f, "Geometry error: {message}"),
            ConvertError::Io { context, message } => write!(f, "I/O error ({context}): {message}"),
            ConvertError::Json { message } => write!(f, "GeoJSON error: {message}"),
            ConvertError::Config { message } => write!(f, "Configuration error: {message}"),
            ConvertError::Unsupported { feature } => {
                write!(f, "Unsupported feature: '{feature}'")
            }
        }
    }
}

impl std::error::Error for ConvertError {}

impl From<std::io::Error> for ConvertError {
    fn from(err: std::io::Error) -> Self {
        ConvertError::Io {
            context: "IO".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConvertError {
    fn from(err: serde_json::Error) -> Self {
        ConvertError::Json {
            message: err.to_string(),
        }
    }
}

/// Result type for robomap operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

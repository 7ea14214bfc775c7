// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout robomap.
//!
//! - [`ConvertError`] - Error taxonomy for conversions
//! - [`CodecValue`] - Generic decoded value tree

pub mod error;
pub mod value;

pub use error::{ConvertError, Result};
pub use value::{CodecValue, DecodedMessage};

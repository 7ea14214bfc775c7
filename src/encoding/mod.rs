// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message payload encodings.

pub mod ros1;

pub use ros1::{Ros1Decoder, Ros1Writer};

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: container formats and topic filtering.

pub mod filter;
pub mod formats;

pub use filter::{TopicFilter, DEFAULT_MAP_TOPIC};
pub use formats::bag::{BagReader, BagWriter, Demultiplexer};

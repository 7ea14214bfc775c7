// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bag summaries.

use std::collections::HashMap;
use std::path::Path;

use crate::core::Result;
use crate::io::filter::TopicFilter;
use crate::io::formats::bag::{BagReader, BagRecord, DemuxStats, Demultiplexer};

/// One connection of a bag and how many messages it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub conn_id: u32,
    pub topic: String,
    pub message_type: String,
    pub md5sum: String,
    pub messages: u64,
}

/// Connections of a bag, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagSummary {
    pub topics: Vec<TopicSummary>,
    pub stats: DemuxStats,
}

/// Summarize the bag at `path`.
pub fn inspect_bag(path: &Path) -> Result<BagSummary> {
    summarize(BagReader::open(path)?)
}

/// Summarize a bag record stream.
pub fn summarize<I>(records: I) -> Result<BagSummary>
where
    I: Iterator<Item = Result<BagRecord>>,
{
    let mut demux = Demultiplexer::new(records, TopicFilter::All);
    let mut counts: HashMap<u32, u64> = HashMap::new();
    for message in demux.by_ref() {
        *counts.entry(message?.connection.conn_id).or_default() += 1;
    }

    let (table, stats) = demux.into_parts();
    let topics = table
        .iter()
        .map(|connection| TopicSummary {
            conn_id: connection.conn_id,
            topic: connection.topic.clone(),
            message_type: connection.message_type.clone(),
            md5sum: connection.md5sum.clone(),
            messages: counts.get(&connection.conn_id).copied().unwrap_or(0),
        })
        .collect();
    Ok(BagSummary { topics, stats })
}

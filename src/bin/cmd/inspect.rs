// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Inspect command - list the connections of a bag.

use std::path::PathBuf;

use clap::Args;

use crate::common::Result;
use robomap::inspect_bag;

/// List connections and per-topic message counts.
#[derive(Args, Clone, Debug)]
pub struct InspectCmd {
    /// Input BAG file
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

impl InspectCmd {
    pub fn run(self) -> Result<()> {
        let summary = inspect_bag(&self.input)?;

        println!("=== {} ===", self.input.display());
        println!("Records: {}", summary.stats.records);
        println!("Chunks: {}", summary.stats.chunks);
        println!("Connections: {}", summary.topics.len());
        println!("Messages: {}", summary.stats.matched);
        if summary.stats.unresolved > 0 {
            println!("Unresolved: {}", summary.stats.unresolved);
        }

        println!();
        println!("Connections:");
        for topic in &summary.topics {
            println!(
                "  [{}] {} | {} | {} messages",
                topic.conn_id, topic.topic, topic.message_type, topic.messages
            );
        }

        Ok(())
    }
}

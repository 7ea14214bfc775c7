// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Convert command - bag to GeoJSON and back.

use std::path::PathBuf;

use clap::Subcommand;

use crate::common::{load_config, Result};
use robomap::{bag_to_geojson, geojson_to_bag, ExtractConfig, WriteConfig};

/// Convert between bag and GeoJSON.
#[derive(Subcommand, Clone, Debug)]
pub enum ConvertCmd {
    /// Extract polygons from a ROS1 bag into a GeoJSON FeatureCollection
    ToGeojson {
        /// Input BAG file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output GeoJSON file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Topic to extract (repeatable; default /xbot_monitoring/map)
        #[arg(short, long = "topic", value_name = "TOPIC")]
        topics: Vec<String>,

        /// Topic to skip (repeatable)
        #[arg(long = "exclude-topic", value_name = "TOPIC")]
        exclude_topics: Vec<String>,

        /// Also extract topics matching this regex
        #[arg(long, value_name = "REGEX")]
        topic_regex: Option<String>,

        /// Extract every topic
        #[arg(long)]
        all_topics: bool,

        /// Point field to keep, by path or name (repeatable; default all)
        #[arg(short, long = "field", value_name = "FIELD")]
        fields: Vec<String>,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Write the polygons of a GeoJSON FeatureCollection into a ROS1 bag
    ToBag {
        /// Input GeoJSON file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output BAG file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Topic to publish the polygons on
        #[arg(short, long, value_name = "TOPIC")]
        topic: Option<String>,

        /// header.frame_id of the written messages
        #[arg(long, value_name = "FRAME")]
        frame_id: Option<String>,

        /// TOML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

impl ConvertCmd {
    pub fn run(self) -> Result<()> {
        match self {
            ConvertCmd::ToGeojson {
                input,
                output,
                topics,
                exclude_topics,
                topic_regex,
                all_topics,
                fields,
                config,
            } => {
                let mut extract = load_config(config.as_deref())?.extract;
                apply_extract_flags(
                    &mut extract,
                    topics,
                    exclude_topics,
                    topic_regex,
                    all_topics,
                    fields,
                );
                cmd_to_geojson(input, output, extract)
            }
            ConvertCmd::ToBag {
                input,
                output,
                topic,
                frame_id,
                config,
            } => {
                let mut write = load_config(config.as_deref())?.write;
                if let Some(topic) = topic {
                    write.topic = topic;
                }
                if let Some(frame_id) = frame_id {
                    write.frame_id = frame_id;
                }
                cmd_to_bag(input, output, write)
            }
        }
    }
}

/// Command-line values replace the file's, list by list.
fn apply_extract_flags(
    extract: &mut ExtractConfig,
    topics: Vec<String>,
    exclude_topics: Vec<String>,
    topic_regex: Option<String>,
    all_topics: bool,
    fields: Vec<String>,
) {
    if !topics.is_empty() {
        extract.topics = topics;
    }
    if !exclude_topics.is_empty() {
        extract.exclude_topics = exclude_topics;
    }
    if topic_regex.is_some() {
        extract.topic_regex = topic_regex;
    }
    if all_topics {
        extract.all_topics = true;
    }
    if !fields.is_empty() {
        extract.point_fields = fields;
    }
}

/// Convert BAG to GeoJSON.
fn cmd_to_geojson(input: PathBuf, output: PathBuf, config: ExtractConfig) -> Result<()> {
    let stats = bag_to_geojson(&input, &output, &config)?;

    eprintln!(
        "Wrote {} features to {} ({} messages, {} skipped)",
        stats.features,
        output.display(),
        stats.messages,
        stats.skipped()
    );
    Ok(())
}

/// Convert GeoJSON to BAG.
fn cmd_to_bag(input: PathBuf, output: PathBuf, config: WriteConfig) -> Result<()> {
    let stats = geojson_to_bag(&input, &output, &config)?;

    eprintln!(
        "Wrote {} messages on {} to {} ({} features skipped)",
        stats.messages,
        config.topic,
        output.display(),
        stats.geometry_failures
    );
    Ok(())
}

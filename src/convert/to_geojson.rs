// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bag to GeoJSON.

use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{persist, temp_file_beside, ConvertStats};
use crate::config::ExtractConfig;
use crate::core::{ConvertError, Result};
use crate::extract::PayloadExtractor;
use crate::geo::{close_ring, polygon_feature, FeatureCollection};
use crate::io::formats::bag::{BagReader, BagRecord, Demultiplexer};

/// Extract polygons from the bag at `input` and write them to `output`.
///
/// Nothing is written when a fatal error occurs.
pub fn bag_to_geojson(
    input: &Path,
    output: &Path,
    config: &ExtractConfig,
) -> Result<ConvertStats> {
    let reader = BagReader::open(input)?;
    let (collection, stats) = extract_collection(reader, config)?;

    let text = collection.to_pretty_json()?;
    let mut file = temp_file_beside(output)?;
    file.write_all(text.as_bytes())
        .map_err(|e| ConvertError::io(format!("write {}", output.display()), e.to_string()))?;
    persist(file, output)?;

    info!(input = %input.display(), output = %output.display(), "{stats}");
    if stats.skipped() > 0 {
        warn!(skipped = stats.skipped(), "some records could not be converted");
    }
    Ok(stats)
}

/// Extract polygons from a bag record stream.
///
/// Fatal errors (framing, conflicting connections) end the run; a message
/// that fails to decode is counted and skipped.
pub fn extract_collection<I>(
    records: I,
    config: &ExtractConfig,
) -> Result<(FeatureCollection, ConvertStats)>
where
    I: Iterator<Item = Result<BagRecord>>,
{
    let mut demux = Demultiplexer::new(records, config.topic_filter()?);
    let mut extractor = PayloadExtractor::new().with_point_fields(config.point_fields.clone());
    let mut stats = ConvertStats::default();
    let mut features = Vec::new();

    for message in demux.by_ref() {
        let message = message?;
        let topic = message.connection.topic.as_str();

        let extraction = match extractor.extract(&message) {
            Ok(extraction) => extraction,
            Err(e) if e.is_recoverable() => {
                if !matches!(e, ConvertError::InvalidSchema { .. }) {
                    warn!(topic, record = message.record_index, error = %e, "skipping message");
                }
                stats.count_failure(&e);
                continue;
            }
            Err(e) => return Err(e),
        };

        if extraction.fields.is_empty() {
            debug!(topic, record = message.record_index, "message has no point fields");
        }
        let stamp = extraction.stamp.to_iso8601();
        for field in extraction.fields {
            let ring = match field.check_finite().and_then(|()| close_ring(&field.points)) {
                Ok(ring) => ring,
                Err(e) => {
                    warn!(topic, field = %field.path, error = %e, "skipping point field");
                    stats.count_failure(&e);
                    continue;
                }
            };

            let mut feature = polygon_feature(&ring, topic, &field.path, &stamp);
            if extraction.stamp.is_fallback() {
                if let Some(properties) = feature.properties.as_mut() {
                    properties.insert(
                        "stamp_source".to_string(),
                        Value::from(extraction.stamp.source.as_str()),
                    );
                }
            }
            features.push(feature);
        }
    }

    let (_, demux_stats) = demux.into_parts();
    stats.absorb_demux(demux_stats);
    stats.features = features.len() as u64;
    Ok((FeatureCollection::new(features), stats))
}

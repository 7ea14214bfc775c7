// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! GeoJSON to bag.

use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use tracing::{info, warn};

use super::{persist, temp_file_beside, ConvertStats};
use crate::config::WriteConfig;
use crate::core::{ConvertError, Result};
use crate::encoding::ros1::{
    encode_polygon_stamped, POLYGON_STAMPED_DEFINITION, POLYGON_STAMPED_MD5, POLYGON_STAMPED_TYPE,
};
use crate::extract::stamp::{now_ros_time, parse_iso8601};
use crate::geo::{FeatureCollection, Geometry};
use crate::io::formats::bag::BagWriter;

/// Write the polygons of the GeoJSON document at `input` as a bag at
/// `output`.
pub fn geojson_to_bag(input: &Path, output: &Path, config: &WriteConfig) -> Result<ConvertStats> {
    let text = std::fs::read_to_string(input)
        .map_err(|e| ConvertError::io(format!("read {}", input.display()), e.to_string()))?;
    let collection = FeatureCollection::from_json(&text)?;

    let file = temp_file_beside(output)?;
    let (sink, stats) = write_collection(&collection, BufWriter::new(file), config)?;
    let file = sink
        .into_inner()
        .map_err(|e| ConvertError::io(format!("flush {}", output.display()), e.to_string()))?;
    persist(file, output)?;

    info!(
        input = %input.display(),
        output = %output.display(),
        messages = stats.messages,
        skipped = stats.geometry_failures,
        "wrote bag"
    );
    Ok(stats)
}

/// Write every Polygon feature of `collection` as one
/// `geometry_msgs/PolygonStamped` message, in document order.
///
/// Only the exterior ring is written. Features without a usable Polygon
/// geometry are counted in `geometry_failures` and skipped. The message
/// time comes from `properties.stamp` when it is RFC 3339, else the
/// current time.
pub fn write_collection<W: Write + Seek>(
    collection: &FeatureCollection,
    sink: W,
    config: &WriteConfig,
) -> Result<(W, ConvertStats)> {
    let mut writer = BagWriter::new(sink)?;
    let mut stats = ConvertStats {
        features: collection.features.len() as u64,
        ..Default::default()
    };
    let mut conn_id = None;

    for (index, feature) in collection.features.iter().enumerate() {
        let ring = match feature.geometry.as_ref().and_then(Geometry::polygon_exterior) {
            Some(ring) if !ring.is_empty() => ring,
            _ => {
                let kind = feature
                    .geometry
                    .as_ref()
                    .map_or("null", |g| g.kind.as_str());
                warn!(feature = index, geometry = kind, "skipping feature without a polygon ring");
                stats.count_failure(&ConvertError::geometry(format!(
                    "feature {index} has no polygon ring"
                )));
                continue;
            }
        };

        let time = feature
            .property_str("stamp")
            .and_then(parse_iso8601)
            .unwrap_or_else(now_ros_time);
        let seq = u32::try_from(index).unwrap_or(u32::MAX);
        let data = encode_polygon_stamped(seq, time, &config.frame_id, &ring)?;

        let id = match conn_id {
            Some(id) => id,
            None => {
                let id = writer.add_connection(
                    &config.topic,
                    POLYGON_STAMPED_TYPE,
                    POLYGON_STAMPED_MD5,
                    POLYGON_STAMPED_DEFINITION,
                )?;
                conn_id = Some(id);
                id
            }
        };
        writer.write_message(id, time, &data)?;
    }

    stats.messages = writer.message_count();
    stats.connections = writer.connection_count() as u64;
    let sink = writer.finish()?;
    Ok((sink, stats))
}

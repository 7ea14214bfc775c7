// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Point list to polygon ring to GeoJSON feature.

use serde_json::{Map, Value};

use super::{Feature, Geometry};
use crate::core::{ConvertError, Result};

/// A closed ring of `(x, y)` positions, first equal to last.
pub type Ring = Vec<[f64; 2]>;

/// Close a point list into a ring.
///
/// The first point is appended unless the last already equals it. Rings
/// with fewer than four positions are returned as-is; topology is not
/// checked.
pub fn close_ring(points: &[[f64; 2]]) -> Result<Ring> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(ConvertError::geometry("cannot build a ring from zero points")),
    };

    let mut ring = points.to_vec();
    if first != last {
        ring.push(first);
    }
    Ok(ring)
}

/// Build a Polygon feature with `{source, field, stamp}` properties.
pub fn polygon_feature(ring: &[[f64; 2]], topic: &str, field: &str, stamp: &str) -> Feature {
    let mut properties = Map::new();
    properties.insert("source".to_string(), Value::from(topic));
    properties.insert("field".to_string(), Value::from(field));
    properties.insert("stamp".to_string(), Value::from(stamp));

    Feature {
        kind: "Feature".to_string(),
        geometry: Some(Geometry::polygon(ring)),
        properties: Some(properties),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_ring_appends_first_point() {
        let ring = close_ring(&[[18.06, 59.33], [18.07, 59.33], [18.07, 59.34]]).unwrap();
        assert_eq!(
            ring,
            vec![[18.06, 59.33], [18.07, 59.33], [18.07, 59.34], [18.06, 59.33]]
        );
    }

    #[test]
    fn test_close_ring_already_closed() {
        let points = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        assert_eq!(close_ring(&points).unwrap(), points.to_vec());
    }

    #[test]
    fn test_close_ring_is_idempotent() {
        let once = close_ring(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]).unwrap();
        assert_eq!(close_ring(&once).unwrap(), once);
    }

    #[test]
    fn test_degenerate_rings() {
        assert_eq!(close_ring(&[[3.0, 4.0]]).unwrap(), vec![[3.0, 4.0]]);
        assert_eq!(
            close_ring(&[[0.0, 0.0], [1.0, 1.0]]).unwrap(),
            vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]
        );
    }

    #[test]
    fn test_empty_point_list() {
        let err = close_ring(&[]).unwrap_err();
        assert!(matches!(err, ConvertError::Geometry { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_polygon_feature_properties() {
        let feature = polygon_feature(
            &[[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]],
            "/xbot_monitoring/map",
            "polygon.points",
            "2023-11-14T22:13:20Z",
        );
        assert_eq!(feature.property_str("source"), Some("/xbot_monitoring/map"));
        assert_eq!(feature.property_str("field"), Some("polygon.points"));
        assert_eq!(feature.property_str("stamp"), Some("2023-11-14T22:13:20Z"));
        assert_eq!(
            feature.geometry.and_then(|g| g.polygon_exterior()),
            Some(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]])
        );
    }
}

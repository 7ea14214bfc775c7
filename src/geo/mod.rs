// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! GeoJSON document model.
//!
//! Only what the map editor exchanges is modelled: a `FeatureCollection` of
//! features whose geometry is kept as raw JSON so that documents with
//! `null` geometry, other geometry types or extra members still load.

pub mod normalize;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::{ConvertError, Result};

pub use normalize::{close_ring, polygon_feature, Ring};

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// Always `"FeatureCollection"`
    #[serde(rename = "type")]
    pub kind: String,
    /// Features in document order
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FeatureCollection {
    /// Create a collection from features.
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            features,
        }
    }

    /// Parse a GeoJSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        if collection.kind != "FeatureCollection" {
            return Err(ConvertError::Json {
                message: format!(
                    "expected a FeatureCollection, found type '{}'",
                    collection.kind
                ),
            });
        }
        Ok(collection)
    }

    /// Render as pretty-printed JSON (two-space indent) with a trailing
    /// newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }
}

/// A GeoJSON `Feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Always `"Feature"`
    #[serde(rename = "type", default = "feature_kind")]
    pub kind: String,
    /// Geometry, `null` allowed
    #[serde(default)]
    pub geometry: Option<Geometry>,
    /// Free-form properties, `null` allowed
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

fn feature_kind() -> String {
    "Feature".to_string()
}

impl Feature {
    /// String property by name.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.as_ref()?.get(name)?.as_str()
    }
}

/// A GeoJSON geometry with its coordinates left as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Geometry type (e.g., "Polygon", "Point")
    #[serde(rename = "type")]
    pub kind: String,
    /// Raw coordinates; `null` for types without them
    #[serde(default)]
    pub coordinates: Value,
}

impl Geometry {
    /// Build a `Polygon` geometry with a single exterior ring.
    pub fn polygon(ring: &[[f64; 2]]) -> Self {
        let ring: Vec<Value> = ring
            .iter()
            .map(|[x, y]| Value::Array(vec![Value::from(*x), Value::from(*y)]))
            .collect();
        Self {
            kind: "Polygon".to_string(),
            coordinates: Value::Array(vec![Value::Array(ring)]),
        }
    }

    /// The exterior ring of a `Polygon`, as `(x, y)` pairs.
    ///
    /// Positions may carry further ordinates, which are ignored. Returns
    /// `None` for other geometry types or malformed coordinates; holes are
    /// not returned.
    pub fn polygon_exterior(&self) -> Option<Vec<[f64; 2]>> {
        if self.kind != "Polygon" {
            return None;
        }
        let exterior = self.coordinates.as_array()?.first()?.as_array()?;
        exterior
            .iter()
            .map(|position| {
                let position = position.as_array()?;
                let x = position.first()?.as_f64()?;
                let y = position.get(1)?.as_f64()?;
                Some([x, y])
            })
            .collect()
    }
}

// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Conversion settings, loadable from a TOML file.
//!
//! ```toml
//! [extract]
//! topics = ["/xbot_monitoring/map"]
//! exclude_topics = []
//! topic_regex = "^/xbot_monitoring/"
//! all_topics = false
//! point_fields = ["points"]
//!
//! [write]
//! topic = "/xbot_monitoring/map"
//! frame_id = "map"
//! ```
//!
//! Every key is optional. Command-line flags are applied on top.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{ConvertError, Result};
use crate::io::filter::{TopicFilter, DEFAULT_MAP_TOPIC};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub write: WriteConfig,
}

impl ConvertConfig {
    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConvertError::io(format!("reading {}", path.display()), e.to_string()))?;
        toml::from_str(&text)
            .map_err(|e| ConvertError::config(format!("{}: {e}", path.display())))
    }

    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConvertError::config(e.to_string()))
    }
}

/// Settings for bag to GeoJSON extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    /// Topics to extract; empty means the map topic
    #[serde(default)]
    pub topics: Vec<String>,
    /// Topics never extracted
    #[serde(default)]
    pub exclude_topics: Vec<String>,
    /// Extract topics matching this pattern as well
    #[serde(default)]
    pub topic_regex: Option<String>,
    /// Extract every topic; overrides `topics` and `topic_regex`
    #[serde(default)]
    pub all_topics: bool,
    /// Point field names to keep; empty keeps every point field
    #[serde(default)]
    pub point_fields: Vec<String>,
}

impl ExtractConfig {
    /// Build the topic filter these settings describe.
    pub fn topic_filter(&self) -> Result<TopicFilter> {
        let selection = if self.all_topics {
            TopicFilter::All
        } else {
            match (&self.topic_regex, self.topics.is_empty()) {
                (Some(pattern), true) => TopicFilter::regex_include(pattern).map_err(regex_error)?,
                (Some(pattern), false) => {
                    let re = regex::Regex::new(pattern).map_err(regex_error)?;
                    let topics = self.topics.clone();
                    TopicFilter::custom(move |topic| {
                        topics.iter().any(|t| t == topic) || re.is_match(topic)
                    })
                }
                (None, false) => TopicFilter::include(self.topics.clone()),
                (None, true) => TopicFilter::default_extraction(),
            }
        };

        if self.exclude_topics.is_empty() {
            Ok(selection)
        } else {
            Ok(TopicFilter::chain(vec![
                selection,
                TopicFilter::exclude(self.exclude_topics.clone()),
            ]))
        }
    }
}

fn regex_error(e: regex::Error) -> ConvertError {
    ConvertError::config(format!("invalid topic_regex: {e}"))
}

/// Settings for GeoJSON to bag writing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WriteConfig {
    /// Topic the polygons are published on
    #[serde(default = "default_write_topic")]
    pub topic: String,
    /// `header.frame_id` of every message
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            topic: default_write_topic(),
            frame_id: default_frame_id(),
        }
    }
}

fn default_write_topic() -> String {
    DEFAULT_MAP_TOPIC.to_string()
}

fn default_frame_id() -> String {
    "map".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_defaults() {
        let config = ConvertConfig::from_toml("").unwrap();
        assert_eq!(config, ConvertConfig::default());
        assert_eq!(config.write.topic, "/xbot_monitoring/map");
        assert_eq!(config.write.frame_id, "map");

        let filter = config.extract.topic_filter().unwrap();
        assert!(filter.should_include("/xbot_monitoring/map"));
        assert!(!filter.should_include("/tf"));
    }

    #[test]
    fn test_full_config() {
        let config = ConvertConfig::from_toml(
            r#"
            [extract]
            topics = ["/boundaries"]
            exclude_topics = ["/xbot_monitoring/debug"]
            topic_regex = "^/xbot_monitoring/"
            point_fields = ["points"]

            [write]
            frame_id = "odom"
            "#,
        )
        .unwrap();
        assert_eq!(config.extract.point_fields, vec!["points"]);
        assert_eq!(config.write.topic, "/xbot_monitoring/map");
        assert_eq!(config.write.frame_id, "odom");

        let filter = config.extract.topic_filter().unwrap();
        assert!(filter.should_include("/boundaries"));
        assert!(filter.should_include("/xbot_monitoring/map"));
        assert!(!filter.should_include("/xbot_monitoring/debug"));
        assert!(!filter.should_include("/tf"));
    }

    #[test]
    fn test_all_topics_with_exclusion() {
        let extract = ExtractConfig {
            all_topics: true,
            exclude_topics: vec!["/tf".to_string()],
            ..Default::default()
        };
        let filter = extract.topic_filter().unwrap();
        assert!(filter.should_include("/anything"));
        assert!(!filter.should_include("/tf"));
    }

    #[test]
    fn test_invalid_regex() {
        let extract = ExtractConfig {
            topic_regex: Some("(".to_string()),
            ..Default::default()
        };
        let err = extract.topic_filter().unwrap_err();
        assert!(matches!(err, ConvertError::Config { .. }));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = ConvertConfig::from_toml("[extract]\ntopic = \"/x\"\n").unwrap_err();
        assert!(matches!(err, ConvertError::Config { .. }));
        assert!(ConvertConfig::from_toml("extract = 5").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("robomap.toml");
        std::fs::write(&path, "[write]\ntopic = \"/map_out\"\n").unwrap();
        let config = ConvertConfig::load(&path).unwrap();
        assert_eq!(config.write.topic, "/map_out");

        let missing = ConvertConfig::load(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConvertError::Io { .. }));
    }
}

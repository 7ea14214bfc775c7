// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Topic filtering for message extraction.
//!
//! The demultiplexer consults a [`TopicFilter`] before decoding a payload,
//! so rejected topics cost only their framing.

use std::fmt;
use std::sync::Arc;

/// Topic the mower publishes its map polygons on.
pub const DEFAULT_MAP_TOPIC: &str = "/xbot_monitoring/map";

/// Filter for selecting topics during extraction.
#[derive(Clone, Default)]
pub enum TopicFilter {
    /// Read all topics (no filtering)
    #[default]
    All,
    /// Read only specific topics
    Include(Vec<String>),
    /// Exclude specific topics
    Exclude(Vec<String>),
    /// Include topics matching regex pattern
    RegexInclude(Arc<regex::Regex>),
    /// Exclude topics matching regex pattern
    RegexExclude(Arc<regex::Regex>),
    /// Custom filter function
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
    /// Topic must pass every inner filter
    Chain(Vec<TopicFilter>),
}

impl fmt::Debug for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.debug_tuple("All").finish(),
            Self::Include(v) => f.debug_tuple("Include").field(v).finish(),
            Self::Exclude(v) => f.debug_tuple("Exclude").field(v).finish(),
            Self::RegexInclude(re) => f.debug_tuple("RegexInclude").field(&re.as_str()).finish(),
            Self::RegexExclude(re) => f.debug_tuple("RegexExclude").field(&re.as_str()).finish(),
            Self::Custom(_) => f.debug_tuple("Custom").field(&"<fn>").finish(),
            Self::Chain(v) => f.debug_tuple("Chain").field(v).finish(),
        }
    }
}

impl TopicFilter {
    /// Check if a topic should be included.
    pub fn should_include(&self, topic: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Include(topics) => topics.iter().any(|t| t == topic),
            TopicFilter::Exclude(topics) => !topics.iter().any(|t| t == topic),
            TopicFilter::RegexInclude(re) => re.is_match(topic),
            TopicFilter::RegexExclude(re) => !re.is_match(topic),
            TopicFilter::Custom(f) => f(topic),
            TopicFilter::Chain(filters) => filters.iter().all(|f| f.should_include(topic)),
        }
    }

    /// The allow-list used when nothing else is configured.
    pub fn default_extraction() -> Self {
        Self::Include(vec![DEFAULT_MAP_TOPIC.to_string()])
    }

    /// Create an include filter from topic names.
    pub fn include(topics: Vec<String>) -> Self {
        Self::Include(topics)
    }

    /// Create an exclude filter from topic names.
    pub fn exclude(topics: Vec<String>) -> Self {
        Self::Exclude(topics)
    }

    /// Create a regex include filter.
    pub fn regex_include(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexInclude(Arc::new(re)))
    }

    /// Create a regex exclude filter.
    pub fn regex_exclude(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexExclude(Arc::new(re)))
    }

    /// Create a custom filter from a function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Combine filters; a topic must pass all of them.
    ///
    /// `All` members are dropped and a single remaining filter is returned
    /// as-is.
    pub fn chain(filters: Vec<TopicFilter>) -> Self {
        let mut filters: Vec<TopicFilter> = filters
            .into_iter()
            .filter(|f| !matches!(f, TopicFilter::All))
            .collect();
        match filters.len() {
            0 => TopicFilter::All,
            1 => filters.remove(0),
            _ => TopicFilter::Chain(filters),
        }
    }
}

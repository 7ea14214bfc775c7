// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Message timestamps and their ISO-8601 rendering.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::{CodecValue, DecodedMessage};

/// Where a feature's timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StampSource {
    /// `header.stamp` or a top-level `stamp` field of the payload
    Message,
    /// The `time` field of the message-data record header
    Record,
    /// Decode-time wall clock; nothing in the bag carried a time
    WallClock,
}

impl StampSource {
    pub fn as_str(self) -> &'static str {
        match self {
            StampSource::Message => "message",
            StampSource::Record => "record",
            StampSource::WallClock => "wall_clock",
        }
    }
}

/// A timestamp in nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stamp {
    pub nanos: i64,
    pub source: StampSource,
}

impl Stamp {
    /// Pick the best available timestamp.
    ///
    /// Order: non-zero payload stamp, non-zero record time, wall clock.
    /// A zero time is treated as missing so that it is never reported as
    /// the epoch.
    pub fn resolve(message: &DecodedMessage, record_time: Option<(u32, u32)>) -> Self {
        if let Some(nanos) = payload_stamp(message).filter(|ns| *ns != 0) {
            return Self {
                nanos,
                source: StampSource::Message,
            };
        }
        if let Some((secs, nsecs)) = record_time.filter(|t| *t != (0, 0)) {
            return Self {
                nanos: secs as i64 * 1_000_000_000 + nsecs as i64,
                source: StampSource::Record,
            };
        }
        Self::wall_clock()
    }

    /// The current time.
    pub fn wall_clock() -> Self {
        let now = Utc::now();
        let nanos = now
            .timestamp_nanos_opt()
            .unwrap_or_else(|| now.timestamp().saturating_mul(1_000_000_000));
        Self {
            nanos,
            source: StampSource::WallClock,
        }
    }

    /// Whether this stamp is a wall-clock fallback.
    pub fn is_fallback(&self) -> bool {
        self.source == StampSource::WallClock
    }

    /// RFC 3339 in UTC with a `Z` suffix; fractional seconds only when
    /// non-zero.
    pub fn to_iso8601(&self) -> String {
        let secs = self.nanos.div_euclid(1_000_000_000);
        let nsecs = self.nanos.rem_euclid(1_000_000_000) as u32;
        DateTime::<Utc>::from_timestamp(secs, nsecs)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}

/// `header.stamp`, else a top-level `stamp`.
fn payload_stamp(message: &DecodedMessage) -> Option<i64> {
    message
        .get("header")
        .and_then(CodecValue::as_struct)
        .and_then(|header| header.get("stamp"))
        .and_then(CodecValue::as_timestamp_nanos)
        .or_else(|| {
            message
                .get("stamp")
                .and_then(CodecValue::as_timestamp_nanos)
        })
}

/// Parse an RFC 3339 string into ROS `(secs, nsecs)`.
///
/// Returns `None` for unparsable strings and for instants before the epoch
/// or beyond the `u32` seconds range.
pub fn parse_iso8601(text: &str) -> Option<(u32, u32)> {
    let parsed = DateTime::parse_from_rfc3339(text).ok()?;
    let secs = u32::try_from(parsed.timestamp()).ok()?;
    Some((secs, parsed.timestamp_subsec_nanos()))
}

/// ROS `(secs, nsecs)` for the current time.
pub fn now_ros_time() -> (u32, u32) {
    let now = Utc::now();
    let secs = u32::try_from(now.timestamp()).unwrap_or(u32::MAX);
    (secs, now.timestamp_subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_header_stamp(secs: u32, nsecs: u32) -> DecodedMessage {
        let mut header = DecodedMessage::new();
        header.insert("seq".to_string(), CodecValue::UInt32(0));
        header.insert(
            "stamp".to_string(),
            CodecValue::from_ros1_time(secs, nsecs),
        );
        let mut message = DecodedMessage::new();
        message.insert("header".to_string(), CodecValue::Struct(header));
        message
    }

    #[test]
    fn test_iso_whole_seconds() {
        let stamp = Stamp {
            nanos: 1_700_000_000_000_000_000,
            source: StampSource::Record,
        };
        assert_eq!(stamp.to_iso8601(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_iso_fractional_seconds() {
        let stamp = Stamp {
            nanos: 1_700_000_000_500_000_000,
            source: StampSource::Record,
        };
        assert_eq!(stamp.to_iso8601(), "2023-11-14T22:13:20.500Z");
    }

    #[test]
    fn test_header_stamp_wins() {
        let message = with_header_stamp(1_700_000_000, 0);
        let stamp = Stamp::resolve(&message, Some((1_600_000_000, 0)));
        assert_eq!(stamp.source, StampSource::Message);
        assert_eq!(stamp.nanos, 1_700_000_000_000_000_000);
    }

    #[test]
    fn test_top_level_stamp() {
        let mut message = DecodedMessage::new();
        message.insert("stamp".to_string(), CodecValue::from_ros1_time(42, 7));
        let stamp = Stamp::resolve(&message, None);
        assert_eq!(stamp.source, StampSource::Message);
        assert_eq!(stamp.nanos, 42_000_000_007);
    }

    #[test]
    fn test_zero_header_stamp_falls_back_to_record() {
        let message = with_header_stamp(0, 0);
        let stamp = Stamp::resolve(&message, Some((1_700_000_000, 0)));
        assert_eq!(stamp.source, StampSource::Record);
        assert_eq!(stamp.to_iso8601(), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_wall_clock_fallback() {
        let stamp = Stamp::resolve(&DecodedMessage::new(), Some((0, 0)));
        assert!(stamp.is_fallback());
        assert_eq!(stamp.source.as_str(), "wall_clock");
        assert!(stamp.nanos > 1_700_000_000_000_000_000);
    }

    #[test]
    fn test_parse_iso8601() {
        assert_eq!(
            parse_iso8601("2023-11-14T22:13:20Z"),
            Some((1_700_000_000, 0))
        );
        assert_eq!(
            parse_iso8601("2023-11-14T23:13:20.25+01:00"),
            Some((1_700_000_000, 250_000_000))
        );
        assert_eq!(parse_iso8601("yesterday"), None);
        assert_eq!(parse_iso8601("1960-01-01T00:00:00Z"), None);
    }
}

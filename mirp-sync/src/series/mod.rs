//! TimeSeries normaliser
//!
//! Turns heterogeneous analytic payloads into canonical, time-ordered,
//! de-duplicated sequences:
//! - [`emotion`]: per-frame emotion percentages -> [`Frame`]
//! - [`focus`]: gaze / head-angle samples -> [`FocusFrame`]
//!
//! Unparseable input yields an empty sequence; nothing in here returns an
//! error.
//!
//! [`Frame`]: mirp_common::Frame
//! [`FocusFrame`]: mirp_common::FocusFrame

pub mod emotion;
pub mod focus;
pub mod loose;

pub use emotion::{normalize, EmotionNormalizer};
pub use focus::{normalize_focus, FocusNormalizer};
pub use loose::{average_score, into_records, mean_record_score, parse_loose};

use mirp_common::config::SeriesConfig;
use serde_json::{Map, Value};
use tracing::warn;

/// Keys that carry an explicit time in seconds, checked in order
const SECOND_KEYS: [&str; 6] = ["t", "tSec", "t_sec", "sec", "time", "timestamp"];

/// Keys that carry a frame index, checked in order
const FRAME_KEYS: [&str; 3] = ["frame_idx", "frame", "frameIdx"];

/// `fps` when it can divide a frame index, else the configured default
///
/// Same bound as `SyncConfig::sanitized`: finite and at least 1.
pub(crate) fn checked_fps(fps: f64) -> f64 {
    if fps.is_finite() && fps >= 1.0 {
        return fps;
    }
    let fallback = SeriesConfig::default().fps;
    warn!("Invalid fps {}, using {}", fps, fallback);
    fallback
}

/// Read a finite number from a record field
///
/// Numeric strings are accepted; booleans and nulls are not.
pub(crate) fn number_field(record: &Map<String, Value>, key: &str) -> Option<f64> {
    let n = match record.get(key)? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Read the first finite number among several key spellings
pub(crate) fn first_number(record: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| number_field(record, k))
}

/// Frame index of a record, if it carries one
pub(crate) fn frame_index(record: &Map<String, Value>) -> Option<f64> {
    first_number(record, &FRAME_KEYS)
}

/// Time of a record in seconds
///
/// An explicit time field wins (`ms` is milliseconds, the others are
/// seconds); otherwise the frame index is divided by `fps`.
pub(crate) fn record_time(record: &Map<String, Value>, fps: f64) -> Option<f64> {
    if let Some(t) = first_number(record, &SECOND_KEYS) {
        return Some(t);
    }
    if let Some(ms) = number_field(record, "ms") {
        return Some(ms / 1000.0);
    }
    frame_index(record).map(|f| f / fps)
}

/// Integer key used to detect duplicate timestamps (microsecond grid)
pub(crate) fn time_key(t: f64) -> i64 {
    (t * 1_000_000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_number_field_accepts_numeric_strings() {
        let r = obj(json!({"a": 1.5, "b": " 2 ", "c": "x", "d": null, "e": true}));
        assert_eq!(number_field(&r, "a"), Some(1.5));
        assert_eq!(number_field(&r, "b"), Some(2.0));
        assert_eq!(number_field(&r, "c"), None);
        assert_eq!(number_field(&r, "d"), None);
        assert_eq!(number_field(&r, "e"), None);
        assert_eq!(number_field(&r, "missing"), None);
    }

    #[test]
    fn test_record_time_explicit_wins_over_frame() {
        let r = obj(json!({"t": 2.0, "frame_idx": 300}));
        assert_eq!(record_time(&r, 30.0), Some(2.0));
    }

    #[test]
    fn test_record_time_from_frame_index() {
        let r = obj(json!({"frame_idx": 45}));
        assert_eq!(record_time(&r, 30.0), Some(1.5));
        let r = obj(json!({"frame": 60}));
        assert_eq!(record_time(&r, 30.0), Some(2.0));
    }

    #[test]
    fn test_record_time_milliseconds() {
        let r = obj(json!({"ms": 2500}));
        assert_eq!(record_time(&r, 30.0), Some(2.5));
    }

    #[test]
    fn test_record_time_absent() {
        let r = obj(json!({"happy": 10}));
        assert_eq!(record_time(&r, 30.0), None);
    }

    #[test]
    fn test_time_key_merges_equivalent_times() {
        assert_eq!(time_key(30.0 / 30.0), time_key(1.0));
        assert_ne!(time_key(1.0), time_key(1.001));
    }
}

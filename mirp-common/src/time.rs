//! Timestamp and time-unit utilities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Unit a caller declares for incoming time values
///
/// Transcript payloads arrive either in seconds or in milliseconds; the unit
/// is declared by the caller, never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    #[serde(rename = "s", alias = "seconds")]
    Seconds,
    #[serde(rename = "ms", alias = "milliseconds")]
    Milliseconds,
}

impl TimeUnit {
    /// Convert a value expressed in this unit to seconds
    pub fn to_seconds(self, value: f64) -> f64 {
        match self {
            TimeUnit::Seconds => value,
            TimeUnit::Milliseconds => value / 1000.0,
        }
    }

    /// Parse the short CLI / config form ("s" or "ms")
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "seconds" => Some(TimeUnit::Seconds),
            "ms" | "milliseconds" => Some(TimeUnit::Milliseconds),
            _ => None,
        }
    }
}

/// Clamp a time to `[lo, hi]`, mapping NaN to `lo`
pub fn clamp_time(t: f64, lo: f64, hi: f64) -> f64 {
    if t.is_nan() {
        return lo;
    }
    t.max(lo).min(hi.max(lo))
}

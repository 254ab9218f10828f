//! Emotion series normaliser
//!
//! Accepts any of the payload shapes handled by [`super::loose`] and
//! produces [`Frame`]s on the percentage scale, sorted by time with one
//! frame per timestamp.

use super::{checked_fps, into_records, parse_loose, record_time, time_key};
use mirp_common::config::{RescalePolicy, SeriesConfig};
use mirp_common::{EmotionLabel, EmotionProbs, Frame};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// One record after field extraction, before scaling
struct RawRecord {
    t: f64,
    pairs: Vec<(EmotionLabel, f64)>,
}

impl RawRecord {
    fn all_probabilities(&self) -> bool {
        self.pairs.iter().all(|&(_, v)| v <= 1.0)
    }
}

/// Emotion series normaliser with a fixed fps and rescale policy
#[derive(Debug, Clone)]
pub struct EmotionNormalizer {
    fps: f64,
    rescale: RescalePolicy,
}

impl EmotionNormalizer {
    pub fn new(config: &SeriesConfig) -> Self {
        Self {
            fps: checked_fps(config.fps),
            rescale: config.rescale,
        }
    }

    /// Normaliser with the default per-record heuristic
    pub fn with_fps(fps: f64) -> Self {
        Self {
            fps: checked_fps(fps),
            rescale: RescalePolicy::PerRecord,
        }
    }

    /// Normalise an already-decoded payload
    ///
    /// # Returns
    /// Frames sorted ascending by `t`, no two sharing a timestamp. Records
    /// without a usable time or without any emotion field are skipped.
    pub fn normalize(&self, raw: &Value) -> Vec<Frame> {
        let records: Vec<RawRecord> = into_records(raw.clone())
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|obj| self.extract(obj))
            .collect();

        let series_is_probabilities = self.rescale == RescalePolicy::WholeSeries
            && !records.is_empty()
            && records.iter().all(RawRecord::all_probabilities);

        // Last record for a timestamp wins; BTreeMap keeps time order
        let mut by_time: BTreeMap<i64, Frame> = BTreeMap::new();
        for record in records {
            let rescale = match self.rescale {
                RescalePolicy::PerRecord => record.all_probabilities(),
                RescalePolicy::WholeSeries => series_is_probabilities,
                RescalePolicy::Never => false,
            };
            let factor = if rescale { 100.0 } else { 1.0 };
            let probs = EmotionProbs::from_pairs(
                record
                    .pairs
                    .iter()
                    .map(|&(label, v)| (label, (v * factor).clamp(0.0, 100.0))),
            );
            by_time.insert(time_key(record.t), Frame { t: record.t, probs });
        }

        let frames: Vec<Frame> = by_time.into_values().collect();
        debug!("Normalised emotion series: {} frames", frames.len());
        frames
    }

    /// Normalise payload text, salvaging malformed JSON
    pub fn normalize_text(&self, text: &str) -> Vec<Frame> {
        match parse_loose(text) {
            Some(value) => self.normalize(&value),
            None => {
                debug!("Emotion payload unparseable, empty series");
                Vec::new()
            }
        }
    }

    fn extract(&self, obj: &Map<String, Value>) -> Option<RawRecord> {
        let t = record_time(obj, self.fps)?;
        if t < 0.0 {
            return None;
        }

        let pairs: Vec<(EmotionLabel, f64)> = obj
            .iter()
            .filter_map(|(key, value)| {
                let label = EmotionLabel::from_key(key)?;
                let v = match value {
                    Value::Number(n) => n.as_f64()?,
                    Value::String(s) => s.trim().parse::<f64>().ok()?,
                    _ => return None,
                };
                v.is_finite().then_some((label, v))
            })
            .collect();

        if pairs.is_empty() {
            return None;
        }
        Some(RawRecord { t, pairs })
    }
}

/// Normalise a raw emotion payload with the per-record rescale heuristic
///
/// # Arguments
/// * `raw` - Decoded JSON: array, wrapper object or JSON-in-a-string
/// * `fps` - Frame rate used when a record only carries a frame index
pub fn normalize(raw: &Value, fps: f64) -> Vec<Frame> {
    EmotionNormalizer::with_fps(fps).normalize(raw)
}

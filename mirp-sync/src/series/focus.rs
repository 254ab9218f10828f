//! Focus / gaze series normaliser

use super::{
    checked_fps, first_number, frame_index, into_records, number_field, parse_loose, record_time,
};
use mirp_common::config::SeriesConfig;
use mirp_common::FocusFrame;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Angles below this magnitude (in both gaze components) are radians
const RADIAN_LIMIT: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct FocusNormalizer {
    fps: f64,
}

impl FocusNormalizer {
    pub fn new(config: &SeriesConfig) -> Self {
        Self { fps: checked_fps(config.fps) }
    }

    pub fn with_fps(fps: f64) -> Self {
        Self {
            fps: checked_fps(fps),
        }
    }

    /// Normalise a decoded focus payload
    ///
    /// Output is sorted by frame index with one entry per frame (the last
    /// record for a frame wins).
    pub fn normalize(&self, raw: &Value) -> Vec<FocusFrame> {
        let mut by_frame: BTreeMap<u64, FocusFrame> = BTreeMap::new();
        for record in into_records(raw.clone()) {
            if let Some(frame) = record.as_object().and_then(|obj| self.extract(obj)) {
                by_frame.insert(frame.frame, frame);
            }
        }

        let frames: Vec<FocusFrame> = by_frame.into_values().collect();
        debug!("Normalised focus series: {} frames", frames.len());
        frames
    }

    pub fn normalize_text(&self, text: &str) -> Vec<FocusFrame> {
        parse_loose(text)
            .map(|value| self.normalize(&value))
            .unwrap_or_default()
    }

    fn extract(&self, obj: &Map<String, Value>) -> Option<FocusFrame> {
        let frame = match frame_index(obj) {
            Some(f) => f,
            None => (record_time(obj, self.fps)? * self.fps).round(),
        };
        if frame < 0.0 {
            return None;
        }
        let frame = frame.round() as u64;

        // An explicit time field wins over frame / fps
        let t_sec = match record_time(obj, self.fps) {
            Some(t) if t >= 0.0 => t,
            _ => frame as f64 / self.fps,
        };

        let angle = |snake: &str, camel: &str| first_number(obj, &[snake, camel]).unwrap_or(0.0);
        let head_yaw = angle("head_yaw", "headYaw");
        let head_pitch = angle("head_pitch", "headPitch");
        let (gaze_yaw, gaze_pitch) =
            gaze_to_degrees(angle("gaze_yaw", "gazeYaw"), angle("gaze_pitch", "gazePitch"));

        let score = number_field(obj, "score").unwrap_or(0.0).clamp(0.0, 100.0);

        Some(FocusFrame {
            frame,
            t_sec,
            head_yaw,
            head_pitch,
            gaze_yaw,
            gaze_pitch,
            score,
        })
    }
}

/// Convert a gaze pair to degrees when it looks like radians
///
/// Both components must be below [`RADIAN_LIMIT`] in magnitude; a pair with
/// one large component is already in degrees.
pub fn gaze_to_degrees(yaw: f64, pitch: f64) -> (f64, f64) {
    if yaw.abs() < RADIAN_LIMIT && pitch.abs() < RADIAN_LIMIT {
        (yaw.to_degrees(), pitch.to_degrees())
    } else {
        (yaw, pitch)
    }
}

/// Normalise a raw focus payload
pub fn normalize_focus(raw: &Value, fps: f64) -> Vec<FocusFrame> {
    FocusNormalizer::with_fps(fps).normalize(raw)
}

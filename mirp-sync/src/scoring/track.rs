//! Time-indexed score track backing the score badge

use super::affect::{score_focus_series, AffectScorer, ScoreSample};
use mirp_common::human_time::format_score;
use mirp_common::{FocusFrame, Frame};

/// Which series a track was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Emotion,
    Focus,
}

/// Scored samples sorted by time, looked up by binary search
#[derive(Debug, Clone)]
pub struct ScoreTrack {
    kind: TrackKind,
    samples: Vec<ScoreSample>,
}

impl ScoreTrack {
    /// Build an AES track from normalised emotion frames
    pub fn from_emotion(frames: &[Frame], scorer: &AffectScorer) -> Self {
        Self {
            kind: TrackKind::Emotion,
            samples: scorer.score_series(frames),
        }
    }

    /// Build a track from the upstream focus scores
    pub fn from_focus(frames: &[FocusFrame]) -> Self {
        Self {
            kind: TrackKind::Focus,
            samples: score_focus_series(frames),
        }
    }

    pub fn empty(kind: TrackKind) -> Self {
        Self {
            kind,
            samples: Vec::new(),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn samples(&self) -> &[ScoreSample] {
        &self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time of the last sample (0 when empty)
    pub fn last_time(&self) -> f64 {
        self.samples.last().map(|s| s.t).unwrap_or(0.0)
    }

    /// Sample displayed at time `t`
    ///
    /// The first sample whose time is at or after `t`; past the end of the
    /// track the last sample holds.
    pub fn sample_at(&self, t: f64) -> Option<&ScoreSample> {
        let last = self.samples.last()?;
        let idx = self.samples.partition_point(|s| s.t < t);
        Some(self.samples.get(idx).unwrap_or(last))
    }

    /// Score at `t`, 0 when the track is empty
    pub fn score_at(&self, t: f64) -> f64 {
        self.sample_at(t).map(|s| s.score).unwrap_or(0.0)
    }

    /// Badge text at `t`: one decimal, `"0.0"` without data or duration
    pub fn display_text(&self, t: f64, total_duration: f64) -> String {
        if total_duration <= 0.0 || !total_duration.is_finite() {
            return format_score(0.0);
        }
        format_score(self.score_at(t))
    }
}

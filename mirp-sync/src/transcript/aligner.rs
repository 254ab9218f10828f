//! Transcript aligner
//!
//! Maps playback time to the active segment and word. Segment activation
//! tracking follows the same cached-index scheme as a song timeline:
//! the current index is checked first (hot path while time advances
//! linearly) and the whole list is searched only when playback leaves it.

use super::segment::{normalize_segments, Segment, Token};
use mirp_common::config::TranscriptConfig;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct TranscriptAligner {
    segments: Vec<Segment>,
    epsilon: f64,
    /// `None` until the first [`advance`](Self::advance); `Some(None)` between segments
    current: Option<Option<usize>>,
}

impl TranscriptAligner {
    /// Wrap already-normalised segments
    pub fn new(segments: Vec<Segment>, epsilon_sec: f64) -> Self {
        Self {
            segments,
            epsilon: epsilon_sec.max(0.0),
            current: None,
        }
    }

    /// Normalise a raw payload and build an aligner over it
    pub fn from_value(raw: &Value, config: &TranscriptConfig, total_duration: Option<f64>) -> Self {
        Self::new(
            normalize_segments(raw, config, total_duration),
            config.epsilon_sec,
        )
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0.0)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the segment active at `t`
    ///
    /// An exact window match wins; otherwise the nearest segment whose
    /// epsilon-widened window contains `t`.
    pub fn active_index(&self, t: f64) -> Option<usize> {
        if self.segments.is_empty() || !t.is_finite() {
            return None;
        }

        // Last segment starting at or before t
        let upto = self.segments.partition_point(|s| s.start <= t);
        if upto > 0 && self.segments[upto - 1].contains(t) {
            return Some(upto - 1);
        }

        // Candidates whose widened window can reach t lie around `upto`
        let lo = upto.saturating_sub(2);
        let hi = (upto + 2).min(self.segments.len());
        (lo..hi)
            .filter(|&i| self.segments[i].contains_widened(t, self.epsilon))
            .min_by(|&a, &b| {
                self.segments[a]
                    .distance(t)
                    .total_cmp(&self.segments[b].distance(t))
            })
    }

    pub fn active_segment(&self, t: f64) -> Option<&Segment> {
        self.active_index(t).map(|i| &self.segments[i])
    }

    /// Word of `segment` active at `t`; whitespace tokens are never active
    pub fn active_token<'a>(&self, segment: &'a Segment, t: f64) -> Option<(usize, &'a Token)> {
        let words = || {
            segment
                .tokens
                .iter()
                .enumerate()
                .filter(|(_, tok)| !tok.is_whitespace() && tok.end > tok.start)
        };
        if let Some(hit) = words().find(|(_, tok)| tok.contains(t)) {
            return Some(hit);
        }
        words()
            .filter(|(_, tok)| t >= tok.start - self.epsilon && t < tok.end + self.epsilon)
            .min_by(|(_, a), (_, b)| {
                let da = (t - a.start).abs().min((t - a.end).abs());
                let db = (t - b.start).abs().min((t - b.end).abs());
                da.total_cmp(&db)
            })
    }

    /// Character to highlight when the segment has no usable token timing
    ///
    /// Proportional to the elapsed share of the segment; `None` for text
    /// shorter than two characters.
    pub fn approx_char_index(segment: &Segment, t: f64) -> Option<usize> {
        let len = segment.text.chars().count();
        if len < 2 {
            return None;
        }
        let ratio = ((t - segment.start) / segment.duration().max(1e-4)).clamp(0.0, 1.0);
        Some(((ratio * len as f64).floor() as usize).min(len - 1))
    }

    /// Track the active segment across calls
    ///
    /// # Returns
    /// `(changed, index)`. The first call never reports a change; after
    /// that `changed` is true whenever the active segment (or the gap
    /// state) differs from the previous call. Drives auto-scroll.
    pub fn advance(&mut self, t: f64) -> (bool, Option<usize>) {
        // Hot path: still inside the cached segment
        if let Some(Some(idx)) = self.current {
            if self.segments.get(idx).is_some_and(|s| s.contains(t)) {
                return (false, Some(idx));
            }
        }

        let new_index = self.active_index(t);
        let changed = match self.current {
            Some(old) => old != new_index,
            None => false,
        };
        self.current = Some(new_index);
        (changed, new_index)
    }

    /// Forget the cached index (after a seek the next advance is a fresh start)
    pub fn reset_tracking(&mut self) {
        self.current = None;
    }
}

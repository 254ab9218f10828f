//! Session-level summaries: nearest frame, polarity, distribution, overall score

use super::affect::{valence, AffectScorer, ScoreSample};
use mirp_common::{EmotionLabel, EmotionProbs, Frame};

/// Frame whose time is closest to `t` (earlier frame on a tie)
pub fn nearest_frame(frames: &[Frame], t: f64) -> Option<&Frame> {
    if frames.is_empty() || t.is_nan() {
        return frames.first();
    }
    let idx = frames.partition_point(|f| f.t < t);
    match (idx.checked_sub(1).and_then(|i| frames.get(i)), frames.get(idx)) {
        (Some(before), Some(after)) => {
            if (t - before.t) <= (after.t - t) {
                Some(before)
            } else {
                Some(after)
            }
        }
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// Probability-weighted valence of a frame in [-1, 1]
///
/// 0 for a frame without usable mass.
pub fn polarity(frame: &Frame) -> f64 {
    match AffectScorer::normalized(&frame.probs) {
        Some(p) => EmotionLabel::ALL
            .iter()
            .zip(p.iter())
            .map(|(&label, &pi)| pi * valence(label))
            .sum::<f64>()
            .clamp(-1.0, 1.0),
        None => 0.0,
    }
}

/// What an emotion distribution is computed over
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistributionMode {
    /// The frame nearest to this time
    AtTime(f64),
    /// Mean over every frame of the series
    Average,
}

/// Emotion distribution as percentages summing to 100
///
/// All zeros when there is no data.
pub fn emotion_distribution(frames: &[Frame], mode: DistributionMode) -> EmotionProbs {
    let mut acc = [0.0; EmotionLabel::COUNT];
    let mut count = 0usize;

    let selected: Vec<&Frame> = match mode {
        DistributionMode::AtTime(t) => nearest_frame(frames, t).into_iter().collect(),
        DistributionMode::Average => frames.iter().collect(),
    };

    for frame in selected {
        if let Some(p) = AffectScorer::normalized(&frame.probs) {
            for (slot, pi) in acc.iter_mut().zip(p) {
                *slot += pi;
            }
            count += 1;
        }
    }

    if count == 0 {
        return EmotionProbs::new();
    }
    EmotionProbs::from_pairs(
        EmotionLabel::ALL
            .iter()
            .zip(acc)
            .map(|(&label, sum)| (label, sum / count as f64 * 100.0)),
    )
}

/// Overall session score shown in the report header
///
/// An explicit upstream average wins; otherwise the mean of the track.
/// Rounded to an integer and clamped to [0, 100]. `None` when neither is
/// available.
pub fn overall_score(explicit_average: Option<f64>, samples: &[ScoreSample]) -> Option<f64> {
    let raw = match explicit_average.filter(|v| v.is_finite()) {
        Some(avg) => avg,
        None if samples.is_empty() => return None,
        None => samples.iter().map(|s| s.score).sum::<f64>() / samples.len() as f64,
    };
    Some(raw.round().clamp(0.0, 100.0))
}

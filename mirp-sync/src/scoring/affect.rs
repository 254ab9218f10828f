//! Affective Engagement Score (AES)
//!
//! Blends three views of one emotion vector into a single 0-100 number:
//! - valence: probability-weighted polarity, rescaled from [-1, 1] to [0, 1]
//! - arousal: probability-weighted intensity in [0, 1]
//! - confidence: 1 - normalised Shannon entropy (1 = one label, 0 = uniform)
//!
//! The scorer never fails. A vector with no usable mass scores 0 with a
//! neutral dominant label.

use mirp_common::{EmotionLabel, EmotionProbs, FocusFrame, Frame};
use serde::{Deserialize, Serialize};

/// Floor applied inside `ln` so zero probabilities contribute nothing
const ENTROPY_EPSILON: f64 = 1e-12;

/// Polarity of each label in [-1, 1]
pub const fn valence(label: EmotionLabel) -> f64 {
    match label {
        EmotionLabel::Angry => -0.9,
        EmotionLabel::Disgust => -0.7,
        EmotionLabel::Fear => -0.8,
        EmotionLabel::Sad => -0.9,
        EmotionLabel::Happy => 0.9,
        EmotionLabel::Surprise => 0.3,
        EmotionLabel::Neutral => 0.0,
    }
}

/// Intensity of each label in [0, 1]
pub const fn arousal(label: EmotionLabel) -> f64 {
    match label {
        EmotionLabel::Angry => 0.8,
        EmotionLabel::Disgust => 0.4,
        EmotionLabel::Fear => 0.9,
        EmotionLabel::Sad => 0.2,
        EmotionLabel::Happy => 0.7,
        EmotionLabel::Surprise => 1.0,
        EmotionLabel::Neutral => 0.1,
    }
}

/// Blend weights of the three components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AesWeights {
    pub valence: f64,
    pub arousal: f64,
    pub confidence: f64,
}

impl Default for AesWeights {
    fn default() -> Self {
        Self {
            valence: 0.4,
            arousal: 0.4,
            confidence: 0.2,
        }
    }
}

/// Intermediate values of one AES evaluation, all in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AesComponents {
    /// Rescaled valence `(V + 1) / 2`
    pub valence: f64,
    pub arousal: f64,
    pub confidence: f64,
    pub dominant: EmotionLabel,
}

/// One scored sample of a track
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSample {
    pub t: f64,
    /// 0-100, one decimal
    pub score: f64,
    /// `None` for series without an emotion vector (focus)
    pub dominant: Option<EmotionLabel>,
}

/// Stateless AES calculator
#[derive(Debug, Clone, Copy, Default)]
pub struct AffectScorer {
    weights: AesWeights,
}

impl AffectScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: AesWeights) -> Self {
        Self { weights }
    }

    /// Probability vector summing to 1, or `None` when there is no usable mass
    pub fn normalized(probs: &EmotionProbs) -> Option<[f64; EmotionLabel::COUNT]> {
        let mut p = [0.0; EmotionLabel::COUNT];
        for (slot, &v) in p.iter_mut().zip(probs.values().iter()) {
            *slot = (v / 100.0).max(0.0);
        }
        let sum: f64 = p.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return None;
        }
        for v in p.iter_mut() {
            *v /= sum;
        }
        Some(p)
    }

    /// Evaluate the three components of a vector
    pub fn components(&self, probs: &EmotionProbs) -> AesComponents {
        let Some(p) = Self::normalized(probs) else {
            return AesComponents::default();
        };

        let mut v = 0.0;
        let mut a = 0.0;
        let mut entropy = 0.0;
        let mut dominant = EmotionLabel::Neutral;
        let mut best = f64::NEG_INFINITY;

        for (&label, &pi) in EmotionLabel::ALL.iter().zip(p.iter()) {
            v += pi * valence(label);
            a += pi * arousal(label);
            entropy -= pi * pi.max(ENTROPY_EPSILON).ln();
            // Strict comparison: earlier labels win ties
            if pi > best {
                best = pi;
                dominant = label;
            }
        }

        let h_max = (EmotionLabel::COUNT as f64).ln();
        AesComponents {
            valence: ((v + 1.0) / 2.0).clamp(0.0, 1.0),
            arousal: a.clamp(0.0, 1.0),
            confidence: (1.0 - entropy / h_max).clamp(0.0, 1.0),
            dominant,
        }
    }

    /// AES of a vector in [0, 1], unrounded
    pub fn aes(&self, probs: &EmotionProbs) -> f64 {
        if Self::normalized(probs).is_none() {
            return 0.0;
        }
        let c = self.components(probs);
        let w = &self.weights;
        (w.valence * c.valence + w.arousal * c.arousal + w.confidence * c.confidence)
            .clamp(0.0, 1.0)
    }

    /// AES of a frame on the display scale (0-100, one decimal)
    ///
    /// # Examples
    /// ```
    /// use mirp_common::{EmotionProbs, Frame};
    /// use mirp_sync::scoring::AffectScorer;
    ///
    /// let frame = Frame { t: 0.0, probs: EmotionProbs::new() };
    /// assert_eq!(AffectScorer::new().score(&frame), 0.0);
    /// ```
    pub fn score(&self, frame: &Frame) -> f64 {
        round_tenth(self.aes(&frame.probs) * 100.0)
    }

    /// Score plus dominant label for one frame
    pub fn score_frame(&self, frame: &Frame) -> ScoreSample {
        ScoreSample {
            t: frame.t,
            score: self.score(frame),
            dominant: Some(self.components(&frame.probs).dominant),
        }
    }

    /// Score every frame, preserving order
    pub fn score_series(&self, frames: &[Frame]) -> Vec<ScoreSample> {
        frames.iter().map(|f| self.score_frame(f)).collect()
    }
}

/// Display score of a focus sample: the upstream value, clamped
pub fn focus_score(frame: &FocusFrame) -> f64 {
    if frame.score.is_finite() {
        round_tenth(frame.score.clamp(0.0, 100.0))
    } else {
        0.0
    }
}

/// Score track of a focus series
pub fn score_focus_series(frames: &[FocusFrame]) -> Vec<ScoreSample> {
    frames
        .iter()
        .map(|f| ScoreSample {
            t: f.t_sec,
            score: focus_score(f),
            dominant: None,
        })
        .collect()
}

pub(crate) fn round_tenth(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

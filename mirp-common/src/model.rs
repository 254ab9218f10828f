//! Analytic data model shared by the normaliser, scorer and overlay code
//!
//! All times are seconds (f64). Emotion probabilities are stored on the
//! percentage scale (0-100) once a frame has been normalised.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Closed set of facial-emotion labels produced by the upstream analyser
///
/// The declaration order is significant: it is the fixed ordering used to
/// break ties when picking a dominant label, and `Neutral` comes first so an
/// empty vector resolves to it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Fear,
    Disgust,
    Surprise,
}

impl EmotionLabel {
    /// Number of labels in the closed set
    pub const COUNT: usize = 7;

    /// All labels in tie-breaking order
    pub const ALL: [EmotionLabel; EmotionLabel::COUNT] = [
        EmotionLabel::Neutral,
        EmotionLabel::Happy,
        EmotionLabel::Sad,
        EmotionLabel::Angry,
        EmotionLabel::Fear,
        EmotionLabel::Disgust,
        EmotionLabel::Surprise,
    ];

    /// Payload key for this label
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Happy => "happy",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Surprise => "surprise",
        }
    }

    /// Parse a payload key (case-insensitive)
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|label| label.as_str().eq_ignore_ascii_case(key.trim()))
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label emotion values, one slot per [`EmotionLabel`]
///
/// Labels that were absent from the source record hold 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EmotionProbs([f64; EmotionLabel::COUNT]);

impl EmotionProbs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(label, value)` pairs; later pairs overwrite earlier ones
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (EmotionLabel, f64)>,
    {
        let mut probs = Self::default();
        for (label, value) in pairs {
            probs[label] = value;
        }
        probs
    }

    pub fn get(&self, label: EmotionLabel) -> f64 {
        self.0[label.slot()]
    }

    pub fn set(&mut self, label: EmotionLabel, value: f64) {
        self.0[label.slot()] = value;
    }

    /// Iterate `(label, value)` in tie-breaking order
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        EmotionLabel::ALL.iter().map(move |&label| (label, self.get(label)))
    }

    pub fn values(&self) -> &[f64; EmotionLabel::COUNT] {
        &self.0
    }

    /// Multiply every value in place
    pub fn scale(&mut self, factor: f64) {
        for v in self.0.iter_mut() {
            *v *= factor;
        }
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Index<EmotionLabel> for EmotionProbs {
    type Output = f64;

    fn index(&self, label: EmotionLabel) -> &f64 {
        &self.0[label.slot()]
    }
}

impl IndexMut<EmotionLabel> for EmotionProbs {
    fn index_mut(&mut self, label: EmotionLabel) -> &mut f64 {
        &mut self.0[label.slot()]
    }
}

/// One timestamped emotion sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Seconds from the start of the recording (>= 0)
    pub t: f64,
    /// Percentages 0-100 per label, not necessarily summing to 100
    pub probs: EmotionProbs,
}

/// One gaze / head-angle sample from the focus series
///
/// Computed upstream and consumed read-only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusFrame {
    pub frame: u64,
    /// Derived seconds (`frame / fps` unless the record carried its own time)
    pub t_sec: f64,
    pub head_yaw: f64,
    pub head_pitch: f64,
    pub gaze_yaw: f64,
    pub gaze_pitch: f64,
    /// Upstream focus score 0-100
    pub score: f64,
}

/// Pixel rectangle of the plotted data area, relative to the chart container
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// True when the rectangle cannot host a cursor (nothing measured yet)
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

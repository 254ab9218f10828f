//! Report payload loading
//!
//! Reads the raw emotion, focus and transcript payloads of one interview
//! report from disk and turns them into the normalised inputs a
//! [`ReportSession`](crate::playback::ReportSession) is built from.

use crate::error::Result;
use crate::scoring::{overall_score, AffectScorer, ScoreTrack, TrackKind};
use crate::series::{average_score, mean_record_score, parse_loose, EmotionNormalizer, FocusNormalizer};
use crate::transcript::TranscriptAligner;
use mirp_common::config::SyncConfig;
use mirp_common::{FocusFrame, Frame};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where the payloads of one report live
#[derive(Debug, Clone, Default)]
pub struct ReportSources {
    pub emotion: Option<PathBuf>,
    pub focus: Option<PathBuf>,
    pub transcript: Option<PathBuf>,
}

/// Normalised report inputs
#[derive(Debug, Clone, Default)]
pub struct ReportData {
    pub emotion: Vec<Frame>,
    pub focus: Vec<FocusFrame>,
    /// Raw transcript; segments depend on the total duration, so they are
    /// normalised when the aligner is built
    pub transcript: Option<Value>,
    /// Upstream session score for the emotion series: the wrapper's
    /// `average_score`, else the mean of the records' `score` fields
    pub emotion_average: Option<f64>,
    /// Upstream `average_score` of the focus series
    pub focus_average: Option<f64>,
}

impl ReportData {
    /// Read every configured payload
    ///
    /// Series payloads go through the loose parser and never fail on
    /// content; only unreadable files are errors. A transcript that cannot
    /// be salvaged at all is reported as a JSON error.
    pub fn load(sources: &ReportSources, config: &SyncConfig) -> Result<Self> {
        let mut data = Self::default();

        if let Some(path) = &sources.emotion {
            if let Some(value) = parse_loose(&read_payload(path)?) {
                data.emotion = EmotionNormalizer::new(&config.series).normalize(&value);
                data.emotion_average = average_score(&value).or_else(|| mean_record_score(&value));
            }
            info!("Loaded {} emotion frames from {}", data.emotion.len(), path.display());
        }

        if let Some(path) = &sources.focus {
            if let Some(value) = parse_loose(&read_payload(path)?) {
                data.focus = FocusNormalizer::new(&config.series).normalize(&value);
                data.focus_average = average_score(&value);
            }
            info!("Loaded {} focus frames from {}", data.focus.len(), path.display());
        }

        if let Some(path) = &sources.transcript {
            let text = read_payload(path)?;
            let value = match parse_loose(&text) {
                Some(value) => value,
                None => serde_json::from_str(&text)?,
            };
            data.transcript = Some(value);
        }

        Ok(data)
    }

    /// Score track for the chart: the emotion AES track when emotion data
    /// exists, otherwise the focus track
    pub fn track(&self) -> ScoreTrack {
        if !self.emotion.is_empty() {
            ScoreTrack::from_emotion(&self.emotion, &AffectScorer::new())
        } else if !self.focus.is_empty() {
            ScoreTrack::from_focus(&self.focus)
        } else {
            warn!("Report has no emotion or focus data");
            ScoreTrack::empty(TrackKind::Emotion)
        }
    }

    pub fn aligner(&self, config: &SyncConfig, total_duration: Option<f64>) -> TranscriptAligner {
        match &self.transcript {
            Some(raw) => TranscriptAligner::from_value(raw, &config.transcript, total_duration),
            None => TranscriptAligner::empty(),
        }
    }

    /// Session-level score shown next to the chart
    ///
    /// The upstream score of the series behind `track` wins; otherwise the
    /// mean of the track's samples.
    pub fn overall_score(&self, track: &ScoreTrack) -> Option<f64> {
        let declared = match track.kind() {
            TrackKind::Emotion => self.emotion_average,
            TrackKind::Focus => self.focus_average,
        };
        overall_score(declared, track.samples())
    }
}

fn read_payload(path: &Path) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

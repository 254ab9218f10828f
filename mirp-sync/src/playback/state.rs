//! Playback state owned by the clock bridge

use mirp_common::events::PlayState;
use mirp_common::time::clamp_time;
use serde::Serialize;

/// Time state of one player instance
///
/// Only [`PlaybackClockBridge`](super::PlaybackClockBridge) mutates this;
/// everything else gets it by shared reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    /// Authoritative paused/seek time (seconds)
    pub cursor_time: f64,
    /// High-frequency time, meaningful only while playing
    pub live_time: f64,
    pub is_playing: bool,
    /// Media duration, or the last sample time when the media has none yet
    pub total_duration: f64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            cursor_time: 0.0,
            live_time: 0.0,
            is_playing: false,
            total_duration: 0.0,
        }
    }

    /// Time every consumer should display right now
    pub fn current_time(&self) -> f64 {
        if self.is_playing {
            self.live_time
        } else {
            self.cursor_time
        }
    }

    pub fn play_state(&self) -> PlayState {
        PlayState::from_playing(self.is_playing)
    }

    /// Time domain of the charts: `[0, total]`, widened to `[0, 1]` when
    /// nothing is known about the duration
    pub fn domain(&self) -> (f64, f64) {
        if self.total_duration > 0.0 {
            (0.0, self.total_duration)
        } else {
            (0.0, 1.0)
        }
    }

    /// Clamp a seek target to `[0, total]` (upper bound open while unknown)
    pub fn clamp_seek(&self, t: f64) -> f64 {
        let upper = if self.total_duration > 0.0 {
            self.total_duration
        } else {
            f64::INFINITY
        };
        clamp_time(t, 0.0, upper)
    }

    /// Fraction of the total duration at `t`, 0 while the duration is unknown
    pub fn fraction_at(&self, t: f64) -> f64 {
        if self.total_duration > 0.0 && t.is_finite() {
            (t / self.total_duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

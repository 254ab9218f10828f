//! Playback-related type definitions
//!
//! Supporting types for play/pause state carried on sync events.

use serde::{Deserialize, Serialize};

/// Play state of the media element backing a report view
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    /// Media clock is advancing
    Playing,
    /// Media clock is stopped (initial state, after pause, after end)
    #[default]
    Paused,
}

impl PlayState {
    pub fn from_playing(is_playing: bool) -> Self {
        if is_playing {
            PlayState::Playing
        } else {
            PlayState::Paused
        }
    }

    pub fn is_playing(self) -> bool {
        matches!(self, PlayState::Playing)
    }
}

impl std::fmt::Display for PlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayState::Playing => write!(f, "playing"),
            PlayState::Paused => write!(f, "paused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_state_roundtrip_bool() {
        assert!(PlayState::from_playing(true).is_playing());
        assert!(!PlayState::from_playing(false).is_playing());
        assert_eq!(PlayState::default(), PlayState::Paused);
    }

    #[test]
    fn test_play_state_display() {
        assert_eq!(PlayState::Playing.to_string(), "playing");
        assert_eq!(PlayState::Paused.to_string(), "paused");
    }
}

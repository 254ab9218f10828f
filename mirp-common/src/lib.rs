//! # MIRP Common Library
//!
//! Shared code for the interview-report playback workspace:
//! - Analytic data model (emotion frames, focus frames, plot rectangles)
//! - Event types (SyncEvent enum) and the broadcast EventBus
//! - Configuration loading and config-file resolution
//! - Time units and clock-string formatting

pub mod config;
pub mod error;
pub mod events;
pub mod human_time;
pub mod model;
pub mod time;

pub use error::{Error, Result};
pub use model::{EmotionLabel, EmotionProbs, FocusFrame, Frame, PlotRect};

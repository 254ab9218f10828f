//! # MIRP Sync Library
//!
//! Time-synchronised multimodal playback and scoring for interview reports.
//!
//! **Components:**
//! - [`series`]: loose-JSON recovery and emotion/focus series normalisation
//! - [`scoring`]: composite affect score (AES), focus track and summaries
//! - [`playback`]: clock bridge, cursor spring, scrub controller, report session
//! - [`overlay`]: plot-rectangle measurement and time/pixel mapping
//! - [`transcript`]: segment normalisation and active segment/word lookup
//! - [`report`] and [`logging`]: payload loading and tracing setup for the binary
//!
//! The core is single-threaded and event-driven; a tokio interval only
//! stands in for the display-refresh callback ([`playback::FrameLoop`]).

pub mod error;
pub mod events;
pub mod logging;
pub mod overlay;
pub mod playback;
pub mod report;
pub mod scoring;
pub mod series;
pub mod transcript;

pub use error::{Error, Result};
pub use playback::{PlaybackClockBridge, ReportSession, ScrubController};
pub use report::{ReportData, ReportSources};
pub use scoring::{AffectScorer, ScoreTrack};
pub use transcript::TranscriptAligner;

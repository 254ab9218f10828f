//! Composite score engine
//!
//! - [`affect`]: per-frame AES from an emotion vector, focus score passthrough
//! - [`track`]: time-indexed lookup behind the score badge
//! - [`summary`]: nearest frame, polarity, distribution and session score

pub mod affect;
pub mod summary;
pub mod track;

pub use affect::{focus_score, AesComponents, AesWeights, AffectScorer, ScoreSample};
pub use summary::{emotion_distribution, nearest_frame, overall_score, polarity, DistributionMode};
pub use track::{ScoreTrack, TrackKind};

//! Transcript aligner
//!
//! - [`segment`]: payload normalisation, boundary clipping, token synthesis
//! - [`aligner`]: active segment / word lookup and change tracking

pub mod aligner;
pub mod segment;

pub use aligner::TranscriptAligner;
pub use segment::{normalize_segments, synthesize_tokens, Segment, Token};

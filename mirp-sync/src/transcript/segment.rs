//! Transcript segments and their normalisation
//!
//! After [`normalize_segments`] the list is sorted by start, every
//! segment has a concrete end, and no window overlaps the next one.

use crate::series::{into_records, number_field};
use mirp_common::config::TranscriptConfig;
use mirp_common::time::TimeUnit;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use tracing::{debug, warn};

/// One word (or whitespace run) of a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Token {
    /// Whitespace tokens only preserve spacing; they are never highlighted
    pub fn is_whitespace(&self) -> bool {
        self.text.chars().all(char::is_whitespace)
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    /// Effective end: inferred if missing, clipped against the next start
    pub end: f64,
    pub text: String,
    pub tokens: Vec<Token>,
    /// Tokens were derived from the text rather than supplied
    pub synthesized: bool,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive-start, exclusive-end window
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Window widened by `eps` on both sides
    pub fn contains_widened(&self, t: f64, eps: f64) -> bool {
        t >= self.start - eps && t < self.end + eps
    }

    /// Distance from `t` to the window (0 inside)
    pub fn distance(&self, t: f64) -> f64 {
        if t < self.start {
            self.start - t
        } else if t >= self.end {
            t - self.end
        } else {
            0.0
        }
    }
}

/// Segment as it appears in the payload, before normalisation
#[derive(Debug, Clone)]
struct RawSegment {
    start: f64,
    end: Option<f64>,
    text: String,
    tokens: Vec<Token>,
}

/// Split text into alternating word / whitespace tokens and spread the
/// segment's duration evenly over the words
///
/// Whitespace tokens are zero-width and sit at the end of the preceding
/// word, so concatenating all token texts reproduces the input.
///
/// # Examples
/// ```
/// use mirp_sync::transcript::synthesize_tokens;
///
/// let tokens = synthesize_tokens("hello world", 1.0, 3.0);
/// assert_eq!(tokens.len(), 3);
/// assert_eq!((tokens[0].start, tokens[0].end), (1.0, 2.0));
/// assert_eq!((tokens[2].start, tokens[2].end), (2.0, 3.0));
/// ```
pub fn synthesize_tokens(text: &str, start: f64, end: f64) -> Vec<Token> {
    let mut pieces: Vec<&str> = Vec::new();
    let mut piece_start = 0;
    let mut in_space: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            pieces.push(&text[piece_start..i]);
            piece_start = i;
        }
        in_space = Some(space);
    }
    if piece_start < text.len() {
        pieces.push(&text[piece_start..]);
    }

    let words = pieces
        .iter()
        .filter(|p| !p.chars().all(char::is_whitespace))
        .count();
    if words == 0 {
        return Vec::new();
    }

    let step = (end - start).max(0.0) / words as f64;
    let mut cursor = start;
    let mut word_idx = 0;
    pieces
        .into_iter()
        .map(|piece| {
            if piece.chars().all(char::is_whitespace) {
                return Token {
                    start: cursor,
                    end: cursor,
                    text: piece.to_string(),
                };
            }
            word_idx += 1;
            let token_start = cursor;
            let token_end = if word_idx == words {
                end.max(start)
            } else {
                start + step * word_idx as f64
            };
            cursor = token_end;
            Token {
                start: token_start,
                end: token_end,
                text: piece.to_string(),
            }
        })
        .collect()
}

fn parse_raw(obj: &Map<String, Value>, unit: TimeUnit) -> Option<RawSegment> {
    let start = unit.to_seconds(number_field(obj, "start")?);
    let end = number_field(obj, "end").map(|e| unit.to_seconds(e));
    let text = match obj.get("text") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };

    let tokens = match obj.get("tokens") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|tok| {
                let start = unit.to_seconds(number_field(tok, "start")?);
                let end = unit.to_seconds(number_field(tok, "end")?);
                let text = tok.get("text").and_then(Value::as_str)?.to_string();
                Some(Token { start, end, text })
            })
            .collect(),
        _ => Vec::new(),
    };

    Some(RawSegment {
        start,
        end,
        text,
        tokens,
    })
}

fn by_start(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

/// Normalise supplied tokens into the segment window without overlap
fn clip_tokens(mut tokens: Vec<Token>, start: f64, end: f64, gap: f64) -> Vec<Token> {
    tokens.sort_by(|a, b| by_start(a.start, b.start));
    let starts: Vec<f64> = tokens.iter().map(|t| t.start.clamp(start, end)).collect();
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, mut tok)| {
            tok.start = starts[i];
            let mut tok_end = tok.end.clamp(tok.start, end);
            if let Some(&next) = starts.get(i + 1) {
                tok_end = tok_end.min(next - gap).max(tok.start);
            }
            tok.end = tok_end;
            tok
        })
        .collect()
}

/// Normalise a decoded transcript payload
///
/// # Arguments
/// * `raw` - Array of `{start, end, text, tokens?}` (or a wrapper / string)
/// * `config` - Unit, shaving and boundary settings
/// * `total_duration` - Known media length, used to close the last segment
pub fn normalize_segments(
    raw: &Value,
    config: &TranscriptConfig,
    total_duration: Option<f64>,
) -> Vec<Segment> {
    let total = total_duration.filter(|d| d.is_finite() && *d > 0.0);
    let upper = total.unwrap_or(f64::INFINITY);

    let mut records: Vec<RawSegment> = into_records(raw.clone())
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| parse_raw(obj, config.time_unit))
        .filter(|seg| seg.start.is_finite() && !seg.text.trim().is_empty())
        .map(|mut seg| {
            seg.start = (seg.start + config.shave_start_sec).clamp(0.0, upper);
            seg.end = seg
                .end
                .map(|e| (e - config.shave_end_sec).clamp(0.0, upper));
            seg
        })
        .collect();

    if records.is_empty() {
        warn!("Transcript has no usable segments");
        return Vec::new();
    }

    // Stable: equal starts keep payload order
    records.sort_by(|a, b| by_start(a.start, b.start));

    let next_starts: Vec<Option<f64>> = (0..records.len())
        .map(|i| records.get(i + 1).map(|r| r.start))
        .collect();

    let segments: Vec<Segment> = records
        .into_iter()
        .zip(next_starts)
        .map(|(raw, next_start)| {
            let inferred = match (raw.end, next_start, total) {
                (Some(end), _, _) => end,
                (None, Some(next), _) => next,
                (None, None, Some(total)) => total,
                (None, None, None) => raw.start,
            };
            let mut end = inferred;
            if let Some(next) = next_start {
                end = end.min(next - config.boundary_gap_sec);
            }
            let end = end.max(raw.start);

            let (tokens, synthesized) = if raw.tokens.is_empty() {
                (synthesize_tokens(&raw.text, raw.start, end), true)
            } else {
                (
                    clip_tokens(raw.tokens, raw.start, end, config.boundary_gap_sec),
                    false,
                )
            };

            Segment {
                start: raw.start,
                end,
                text: raw.text,
                tokens,
                synthesized,
            }
        })
        .collect();

    debug!("Normalised transcript: {} segments", segments.len());
    segments
}

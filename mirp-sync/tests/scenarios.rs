//! End-to-end scenarios and cross-module properties
//!
//! Each scenario drives the public API the way a report view would.

mod helpers;

use helpers::{fixture, x_at};
use mirp_common::config::TranscriptConfig;
use mirp_common::{EmotionLabel, EmotionProbs, Frame};
use mirp_sync::overlay::{MeasureTrigger, OverlayMapper};
use mirp_sync::playback::{MediaCall, MediaElement};
use mirp_sync::scoring::AffectScorer;
use mirp_sync::series::{normalize, EmotionNormalizer};
use mirp_sync::transcript::normalize_segments;
use serde_json::json;

fn frame(pairs: &[(EmotionLabel, f64)]) -> Frame {
    Frame {
        t: 0.0,
        probs: EmotionProbs::from_pairs(pairs.iter().copied()),
    }
}

#[test]
fn test_scenario_a_mostly_happy_frame() {
    let f = frame(&[
        (EmotionLabel::Neutral, 10.0),
        (EmotionLabel::Happy, 80.0),
        (EmotionLabel::Sad, 5.0),
        (EmotionLabel::Angry, 5.0),
        (EmotionLabel::Fear, 0.0),
        (EmotionLabel::Disgust, 0.0),
    ]);
    let scorer = AffectScorer::new();
    let sample = scorer.score_frame(&f);
    assert_eq!(sample.dominant, Some(EmotionLabel::Happy));
    assert!(sample.score > 60.0, "AES was {}", sample.score);
}

#[test]
fn test_scenario_b_all_zero_vector() {
    let f = frame(&[]);
    let sample = AffectScorer::new().score_frame(&f);
    assert_eq!(sample.score, 0.0);
    assert_eq!(sample.dominant, Some(EmotionLabel::Neutral));
}

#[test]
fn test_scenario_c_drag_while_playing() {
    let mut fx = fixture(true);
    assert!(fx.session.bridge().is_playing());

    fx.session.pointer_down(x_at(0.2));
    // Below the threshold: nothing happens yet
    fx.session.pointer_move(x_at(0.2) + 3.0);
    assert!(fx.media.calls().is_empty());

    fx.session.pointer_move(x_at(0.2) + 10.0);
    fx.session.pointer_move(x_at(0.2) + 20.0);
    fx.session.pointer_up(Some(x_at(0.2) + 20.0));

    let calls = fx.media.calls();
    assert_eq!(fx.media.count_calls(|c| *c == MediaCall::Pause), 1);
    assert_eq!(fx.media.count_calls(|c| *c == MediaCall::Play), 1);
    assert!(fx.media.count_calls(|c| matches!(c, MediaCall::Seek(_))) >= 2);
    assert_eq!(calls.first(), Some(&MediaCall::Pause));
    assert_eq!(calls.last(), Some(&MediaCall::Play));

    // Seeks follow the pointer
    let seeks: Vec<f64> = calls
        .iter()
        .filter_map(|c| match c {
            MediaCall::Seek(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert!(seeks.windows(2).all(|w| w[0] <= w[1]));
    assert!((seeks[0] - 26.4).abs() < 1e-9);
    assert!(fx.session.bridge().is_playing());
}

#[test]
fn test_scenario_d_tap_on_paused_media() {
    let mut fx = fixture(false);
    assert_eq!(fx.session.bridge().domain(), (0.0, 120.0));

    fx.session.pointer_down(x_at(0.5));
    fx.session.pointer_up(Some(x_at(0.5)));

    assert_eq!(fx.media.calls(), vec![MediaCall::Seek(60.0), MediaCall::Play]);
    assert_eq!(fx.media.current_time(), 60.0);
    assert!(!fx.media.is_paused());
    assert!(fx.session.bridge().is_playing());
}

#[test]
fn test_scenario_e_untimed_segment_words() {
    let segs = normalize_segments(
        &json!([{"start": 1.0, "end": 3.0, "text": "hello world"}]),
        &TranscriptConfig::default(),
        None,
    );
    let words: Vec<_> = segs[0].tokens.iter().filter(|t| !t.is_whitespace()).collect();
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].text, "hello");
    assert_eq!(words[1].text, "world");
    assert!((words[0].end - words[0].start - 1.0).abs() < 1e-9);
    assert!((words[1].end - words[1].start - 1.0).abs() < 1e-9);
    assert_eq!(words[0].start, 1.0);
    assert_eq!(words[1].end, 3.0);
}

#[test]
fn test_scenario_f_fractional_probabilities() {
    let frames = normalize(&json!([{"t": 0, "happy": 0.8, "neutral": 0.2}]), 30.0);
    assert_eq!(frames.len(), 1);
    assert!((frames[0].probs.get(EmotionLabel::Happy) - 80.0).abs() < 1e-9);
    assert!((frames[0].probs.get(EmotionLabel::Neutral) - 20.0).abs() < 1e-9);
}

#[test]
fn test_aes_bounded_and_ordered() {
    let scorer = AffectScorer::new();
    let happy = scorer.score(&frame(&[(EmotionLabel::Happy, 100.0)]));
    for label in EmotionLabel::ALL {
        let s = scorer.score(&frame(&[(label, 100.0)]));
        assert!((0.0..=100.0).contains(&s));
    }
    for label in [EmotionLabel::Angry, EmotionLabel::Fear, EmotionLabel::Sad] {
        assert!(happy > scorer.score(&frame(&[(label, 100.0)])));
    }

    // Mixed vectors stay in range too
    for i in 0..50 {
        let a = (i * 7 % 13) as f64;
        let b = (i * 3 % 11) as f64;
        let c = (i % 5) as f64;
        let s = scorer.score(&frame(&[
            (EmotionLabel::Happy, a),
            (EmotionLabel::Disgust, b),
            (EmotionLabel::Surprise, c),
        ]));
        assert!((0.0..=100.0).contains(&s), "{} out of range", s);
    }
}

#[test]
fn test_normalize_sorted_unique_and_idempotent() {
    let raw = json!({"results": [
        {"frame_idx": 90, "sad": 40},
        {"t": 1.0, "happy": 50},
        {"frame_idx": 30, "angry": 10},
        {"t": 0.5, "fear": 0.3},
        {"t": 2.0, "neutral": 100}
    ]});
    let normalizer = EmotionNormalizer::with_fps(30.0);
    let first = normalizer.normalize(&raw);
    let second = normalizer.normalize(&raw);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].t < w[1].t));
    let times: Vec<f64> = first.iter().map(|f| f.t).collect();
    assert_eq!(times, vec![0.5, 1.0, 2.0, 3.0]);
    // Frame 30 and t=1.0 collide; the later record wins
    assert_eq!(first[1].probs.get(EmotionLabel::Angry), 10.0);
}

#[test]
fn test_truncated_payload_is_salvaged() {
    let text = r#"{"frames": [{"t": 0, "happy": 60}, {"t": 1, "sad": 70}, {"t": 2, "ha"#;
    let frames = EmotionNormalizer::with_fps(30.0).normalize_text(text);
    assert_eq!(frames.len(), 2);
}

#[test]
fn test_pixel_time_round_trip() {
    let mut mapper = OverlayMapper::new(
        Box::new(helpers::chart_layout()),
        mirp_common::config::Margins::default(),
    );
    mapper.request_measure(MeasureTrigger::Resize);
    mapper.set_domain(0.0, 97.3);
    let mut x = helpers::PLOT_LEFT;
    while x <= helpers::PLOT_LEFT + helpers::PLOT_WIDTH {
        let back = mapper.time_to_pixel(mapper.pixel_to_time(x)).unwrap();
        assert!((back - x).abs() < 1e-6, "{} -> {}", x, back);
        x += 7.25;
    }
}

#[test]
fn test_segments_never_overlap() {
    let segs = normalize_segments(
        &json!([
            {"start": 5.0, "end": 9.0, "text": "c"},
            {"start": 0.0, "text": "a"},
            {"start": 2.0, "end": 6.0, "text": "b", "tokens": [
                {"start": 2.0, "end": 4.0, "text": "b1"},
                {"start": 4.0, "end": 7.5, "text": "b2"}
            ]},
            {"start": 8.0, "end": 12.0, "text": "d"}
        ]),
        &TranscriptConfig::default(),
        Some(20.0),
    );
    assert_eq!(segs.len(), 4);
    for pair in segs.windows(2) {
        assert!(pair[0].end <= pair[1].start);
        assert!(pair[0].start <= pair[0].end);
    }
    for seg in &segs {
        for tokens in seg.tokens.windows(2) {
            assert!(tokens[0].end <= tokens[1].start + 1e-12);
        }
        assert!(seg.tokens.iter().all(|t| t.end <= seg.end));
    }
}

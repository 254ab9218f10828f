//! Shared fixtures for mirp-sync integration tests
//!
//! Chart geometry used throughout: container 600x300, plotted area at
//! left 50 with width 500, so x = 50 + fraction * 500.

#![allow(dead_code)]

use mirp_common::config::SyncConfig;
use mirp_common::events::{EventBus, SyncEvent};
use mirp_sync::overlay::{LayoutRect, StaticLayout};
use mirp_sync::playback::{PointerListenerHost, ReportSession, SimulatedMedia};
use mirp_sync::scoring::{AffectScorer, ScoreTrack};
use mirp_sync::series::EmotionNormalizer;
use mirp_sync::transcript::TranscriptAligner;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

pub const PLOT_LEFT: f64 = 50.0;
pub const PLOT_WIDTH: f64 = 500.0;

/// X inside the plotted area for a fraction of the domain
pub fn x_at(fraction: f64) -> f64 {
    PLOT_LEFT + fraction * PLOT_WIDTH
}

pub fn chart_layout() -> StaticLayout {
    StaticLayout::new(
        (600.0, 300.0),
        LayoutRect::new(0.0, 0.0, 600.0, 300.0),
        LayoutRect::new(PLOT_LEFT, 20.0, PLOT_WIDTH, 250.0),
    )
}

/// Listener host that counts registrations
#[derive(Debug, Clone, Default)]
pub struct CountingListeners {
    counts: Arc<Mutex<(usize, usize)>>,
}

impl CountingListeners {
    pub fn attached(&self) -> usize {
        self.counts.lock().unwrap().0
    }

    pub fn detached(&self) -> usize {
        self.counts.lock().unwrap().1
    }
}

impl PointerListenerHost for CountingListeners {
    fn attach(&mut self) {
        self.counts.lock().unwrap().0 += 1;
    }

    fn detach(&mut self) {
        self.counts.lock().unwrap().1 += 1;
    }
}

/// Two-minute emotion track: happy first half, sad second half
pub fn emotion_track() -> ScoreTrack {
    let raw = json!([
        {"t": 0.0, "happy": 90, "neutral": 10},
        {"t": 30.0, "happy": 90, "neutral": 10},
        {"t": 60.0, "sad": 100},
        {"t": 120.0, "sad": 100}
    ]);
    let frames = EmotionNormalizer::with_fps(30.0).normalize(&raw);
    ScoreTrack::from_emotion(&frames, &AffectScorer::new())
}

pub fn transcript() -> TranscriptAligner {
    TranscriptAligner::from_value(
        &json!([
            {"start": 1.0, "end": 3.0, "text": "hello world"},
            {"start": 59.0, "end": 62.0, "text": "second answer"}
        ]),
        &SyncConfig::default().transcript,
        Some(120.0),
    )
}

pub struct Fixture {
    pub session: ReportSession,
    pub media: SimulatedMedia,
    pub listeners: CountingListeners,
    pub bus: Arc<EventBus>,
}

/// Session over a manual-clock media element of 120 s
pub fn fixture(playing: bool) -> Fixture {
    use mirp_sync::playback::MediaElement;

    let bus = Arc::new(EventBus::new(1024));
    let listeners = CountingListeners::default();
    let mut session = ReportSession::new(
        &SyncConfig::default(),
        emotion_track(),
        transcript(),
        Box::new(chart_layout()),
        Box::new(listeners.clone()),
        Arc::clone(&bus),
    );

    let mut media = SimulatedMedia::manual(Some(120.0));
    if playing {
        media.play();
    }
    media.clear_calls();
    session.attach_media(Box::new(media.clone()));

    Fixture {
        session,
        media,
        listeners,
        bus,
    }
}

/// Session with no media element bound
pub fn inert_fixture() -> (ReportSession, CountingListeners) {
    let listeners = CountingListeners::default();
    let session = ReportSession::new(
        &SyncConfig::default(),
        emotion_track(),
        transcript(),
        Box::new(chart_layout()),
        Box::new(listeners.clone()),
        Arc::new(EventBus::default()),
    );
    (session, listeners)
}

/// Everything currently buffered on a receiver
pub fn drain(rx: &mut broadcast::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

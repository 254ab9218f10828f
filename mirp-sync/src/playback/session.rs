//! Report session lifecycle
//!
//! One [`ReportSession`] exists per mounted report view. It owns the clock
//! bridge, scrub controller, overlay mapper, transcript aligner and score
//! track, wires their outputs to the [`EventBus`], and releases everything
//! on [`teardown`](ReportSession::teardown) (also run on drop).

use super::clock::PlaybackClockBridge;
use super::media::{MediaElement, MediaEvent};
use super::scrub::{ScrubAction, ScrubController, ScrubState};
use crate::overlay::{LayoutProvider, MeasureOutcome, MeasureTrigger, OverlayMapper};
use crate::scoring::ScoreTrack;
use crate::transcript::TranscriptAligner;
use mirp_common::config::SyncConfig;
use mirp_common::events::{EventBus, PlayState, SyncEvent};
use mirp_common::human_time::{format_playhead, format_score};
use mirp_common::{EmotionLabel, PlotRect};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// Global pointer listener registration, owned by the embedding layer
///
/// The session attaches exactly once per gesture and detaches on release
/// or teardown.
pub trait PointerListenerHost: Send {
    fn attach(&mut self);
    fn detach(&mut self);
}

/// Host with nothing to register (CLI, headless replay)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListeners;

impl PointerListenerHost for NoopListeners {
    fn attach(&mut self) {}
    fn detach(&mut self) {}
}

/// Result of one analytic evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticReport {
    pub time_sec: f64,
    pub score: f64,
    pub score_text: String,
    pub dominant: Option<EmotionLabel>,
    pub segment_index: Option<usize>,
    pub segment_changed: bool,
}

/// Output of one display frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub cursor_fraction: f64,
    /// Cursor X within the chart container, once the plot is measured
    pub cursor_px: Option<f64>,
    pub analytic: Option<AnalyticReport>,
}

/// Everything a report view renders, evaluated at the current time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSnapshot {
    pub session_id: Uuid,
    pub current_time: f64,
    pub total_duration: f64,
    pub playhead: String,
    pub is_playing: bool,
    pub score: f64,
    pub score_text: String,
    pub dominant: Option<EmotionLabel>,
    pub cursor_fraction: f64,
    pub cursor_px: Option<f64>,
    pub plot_rect: Option<PlotRect>,
    pub segment_index: Option<usize>,
    pub token_index: Option<usize>,
    /// Highlight position for segments without usable token timing
    pub approx_char: Option<usize>,
    pub scrubbing: bool,
}

pub struct ReportSession {
    id: Uuid,
    bridge: PlaybackClockBridge,
    scrub: ScrubController,
    mapper: OverlayMapper,
    transcript: TranscriptAligner,
    track: ScoreTrack,
    listeners: Box<dyn PointerListenerHost>,
    listeners_attached: bool,
    bus: Arc<EventBus>,
    closed: bool,
}

impl ReportSession {
    /// Mount a report view
    ///
    /// The plot is measured immediately (mount trigger); without media the
    /// session is inert until [`attach_media`](Self::attach_media).
    pub fn new(
        config: &SyncConfig,
        track: ScoreTrack,
        transcript: TranscriptAligner,
        layout: Box<dyn LayoutProvider>,
        listeners: Box<dyn PointerListenerHost>,
        bus: Arc<EventBus>,
    ) -> Self {
        let id = Uuid::new_v4();
        let mut bridge = PlaybackClockBridge::new(&config.playback);
        bridge.set_fallback_duration(track.last_time());

        let mut session = Self {
            id,
            bridge,
            scrub: ScrubController::new(config.scrub.drag_threshold_px),
            mapper: OverlayMapper::new(layout, config.overlay.margin),
            transcript,
            track,
            listeners,
            listeners_attached: false,
            bus,
            closed: false,
        };
        session.sync_domain();
        session.on_layout_change(MeasureTrigger::Mount);
        info!(
            session_id = %id,
            "Report session mounted ({} samples, {} transcript segments)",
            session.track.samples().len(),
            session.transcript.len()
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn bridge(&self) -> &PlaybackClockBridge {
        &self.bridge
    }

    pub fn scrub_state(&self) -> ScrubState {
        self.scrub.state()
    }

    pub fn mapper(&self) -> &OverlayMapper {
        &self.mapper
    }

    pub fn transcript(&self) -> &TranscriptAligner {
        &self.transcript
    }

    pub fn track(&self) -> &ScoreTrack {
        &self.track
    }

    pub fn attach_media(&mut self, media: Box<dyn MediaElement>) {
        if self.closed {
            return;
        }
        self.bridge.attach_media(media);
        self.sync_domain();
        info!(session_id = %self.id, "Media attached, total {:.3}s", self.bridge.total_duration());
    }

    /// Forward a media element notification
    pub fn on_media_event(&mut self, event: MediaEvent) {
        if self.closed {
            return;
        }
        debug!(session_id = %self.id, "Media event {:?}", event);
        match event {
            MediaEvent::LoadedMetadata { duration } => {
                self.bridge.on_loaded_metadata(duration);
                self.sync_domain();
            }
            MediaEvent::Play => {
                if self.bridge.on_play() {
                    self.emit_play_state(PlayState::Paused, PlayState::Playing);
                }
            }
            MediaEvent::Pause => {
                let was_playing = self.bridge.is_playing();
                if let Some(t) = self.bridge.on_pause() {
                    if was_playing {
                        self.emit_play_state(PlayState::Playing, PlayState::Paused);
                    }
                    self.evaluate(t);
                }
            }
            MediaEvent::Ended => {
                let was_playing = self.bridge.is_playing();
                if let Some(t) = self.bridge.on_ended() {
                    if was_playing {
                        self.emit_play_state(PlayState::Playing, PlayState::Paused);
                    }
                    self.emit_seek(t);
                    self.transcript.reset_tracking();
                    self.evaluate(t);
                }
            }
        }
    }

    /// Native time-update from the media element (lower rate than frames)
    pub fn on_time_update(&mut self, t: f64, now: Instant) -> Option<AnalyticReport> {
        if self.closed {
            return None;
        }
        let at = self.bridge.on_external_time_update(t, now)?;
        Some(self.evaluate(at))
    }

    /// One display refresh: cursor every frame, analytics when throttled
    pub fn on_display_frame(&mut self, now: Instant) -> Option<FrameReport> {
        if self.closed {
            return None;
        }
        let update = self.bridge.on_display_frame(now);
        if update.cursor_moved {
            self.bus.emit_lossy(SyncEvent::CursorMoved {
                session_id: self.id,
                fraction: update.cursor_fraction,
            });
        }
        let analytic = update.analytic_time.map(|t| self.evaluate(t));
        Some(FrameReport {
            cursor_fraction: update.cursor_fraction,
            cursor_px: self.mapper.fraction_to_pixel(update.cursor_fraction),
            analytic,
        })
    }

    /// Pointer pressed over the overlay (container X)
    pub fn pointer_down(&mut self, x: f64) {
        if self.closed || self.bridge.is_inert() {
            return;
        }
        let actions = self.scrub.pointer_down(x, self.bridge.is_playing());
        self.apply(actions);
    }

    pub fn pointer_move(&mut self, x: f64) {
        if self.closed {
            return;
        }
        let overlay = self.mapper.overlay_box();
        let actions = self.scrub.pointer_move(x, &overlay);
        self.apply(actions);
    }

    /// Pointer released; `None` when the release position is unknown
    pub fn pointer_up(&mut self, x: Option<f64>) {
        if self.closed {
            return;
        }
        let overlay = self.mapper.overlay_box();
        let actions = self.scrub.pointer_up(x, &overlay);
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<ScrubAction>) {
        for action in actions {
            match action {
                ScrubAction::AttachListeners => {
                    if !self.listeners_attached {
                        self.listeners.attach();
                        self.listeners_attached = true;
                    }
                }
                ScrubAction::DetachListeners => {
                    if self.listeners_attached {
                        self.listeners.detach();
                        self.listeners_attached = false;
                    }
                }
                ScrubAction::Pause => {
                    let was_playing = self.bridge.is_playing();
                    if self.bridge.pause().is_some() && was_playing {
                        self.emit_play_state(PlayState::Playing, PlayState::Paused);
                    }
                }
                ScrubAction::Seek(t) => self.seek(t),
                ScrubAction::Play => {
                    if self.bridge.play() {
                        self.emit_play_state(PlayState::Paused, PlayState::Playing);
                    }
                }
            }
        }
    }

    /// Seek the media, then evaluate analytics at the applied time
    pub fn seek(&mut self, t: f64) {
        if self.closed {
            return;
        }
        if let Some(target) = self.bridge.seek(t) {
            self.emit_seek(target);
            self.evaluate(target);
        }
    }

    /// Chart layout changed (mount, DOM mutation, resize)
    pub fn on_layout_change(&mut self, trigger: MeasureTrigger) -> MeasureOutcome {
        let outcome = self.mapper.request_measure(trigger);
        self.publish_measure(outcome);
        outcome
    }

    /// Paint opportunity for a pending re-measurement
    pub fn on_paint(&mut self) -> Option<MeasureOutcome> {
        let outcome = self.mapper.on_paint()?;
        self.publish_measure(outcome);
        Some(outcome)
    }

    fn publish_measure(&self, outcome: MeasureOutcome) {
        if let MeasureOutcome::Measured {
            rect,
            changed: true,
        } = outcome
        {
            self.bus.emit_lossy(SyncEvent::PlotRectChanged {
                session_id: self.id,
                rect,
            });
        }
    }

    /// Current view state
    pub fn snapshot(&self) -> ReportSnapshot {
        let t = self.bridge.current_time();
        let total = self.bridge.total_duration();
        let sample = self.track.sample_at(t);
        let segment_index = self.transcript.active_index(t);
        let segment = segment_index.map(|i| &self.transcript.segments()[i]);
        let token_index = segment
            .and_then(|seg| self.transcript.active_token(seg, t))
            .map(|(i, _)| i);
        let approx_char = segment
            .filter(|seg| seg.synthesized)
            .and_then(|seg| TranscriptAligner::approx_char_index(seg, t));
        let cursor_fraction = self.bridge.cursor_fraction();

        ReportSnapshot {
            session_id: self.id,
            current_time: t,
            total_duration: total,
            playhead: format_playhead(t, total),
            is_playing: self.bridge.is_playing(),
            score: sample.map(|s| s.score).unwrap_or(0.0),
            score_text: self.track.display_text(t, total),
            dominant: sample.and_then(|s| s.dominant),
            cursor_fraction,
            cursor_px: self.mapper.fraction_to_pixel(cursor_fraction),
            plot_rect: self.mapper.plot_rect(),
            segment_index,
            token_index,
            approx_char,
            scrubbing: self.scrub.is_active(),
        }
    }

    /// True while the frame loop has work (playing or cursor settling)
    pub fn needs_frame(&self) -> bool {
        !self.closed && self.bridge.needs_frame()
    }

    /// Unmount: detach listeners (also mid-drag), stop both clocks, abandon
    /// pending measurement. Idempotent.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        let actions = self.scrub.cancel();
        self.apply(actions);
        if self.listeners_attached {
            self.listeners.detach();
            self.listeners_attached = false;
        }
        self.bridge.teardown();
        self.mapper.teardown();
        self.closed = true;
        self.bus.emit_lossy(SyncEvent::SessionClosed {
            session_id: self.id,
            timestamp: mirp_common::time::now(),
        });
        info!(session_id = %self.id, "Report session closed");
    }

    fn sync_domain(&mut self) {
        let (min, max) = self.bridge.domain();
        self.scrub.set_domain(min, max);
        self.mapper.set_domain(min, max);
    }

    /// Score and transcript lookups at `t`, published on the bus
    fn evaluate(&mut self, t: f64) -> AnalyticReport {
        let total = self.bridge.total_duration();
        let sample = self.track.sample_at(t).copied();
        let (segment_changed, segment_index) = self.transcript.advance(t);

        if segment_changed {
            self.bus.emit_lossy(SyncEvent::TranscriptSegmentChanged {
                session_id: self.id,
                segment_index,
            });
        }

        let score = sample.map(|s| s.score).unwrap_or(0.0);
        let dominant = sample.and_then(|s| s.dominant);
        self.bus.emit_lossy(SyncEvent::AnalyticSample {
            session_id: self.id,
            time_sec: t,
            score,
            dominant,
            timestamp: mirp_common::time::now(),
        });

        AnalyticReport {
            time_sec: t,
            score,
            score_text: if total > 0.0 {
                format_score(score)
            } else {
                format_score(0.0)
            },
            dominant,
            segment_index,
            segment_changed,
        }
    }

    fn emit_seek(&self, target_sec: f64) {
        self.bus.emit_lossy(SyncEvent::SeekRequested {
            session_id: self.id,
            target_sec,
            timestamp: mirp_common::time::now(),
        });
    }

    fn emit_play_state(&self, old_state: PlayState, new_state: PlayState) {
        debug!(session_id = %self.id, "Play state {} -> {}", old_state, new_state);
        self.bus.emit_lossy(SyncEvent::PlayStateChanged {
            session_id: self.id,
            old_state,
            new_state,
            timestamp: mirp_common::time::now(),
        });
    }
}

impl Drop for ReportSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

//! Playback clock bridge
//!
//! Mirrors the media element's time into the analytics domain through two
//! logical clocks driven from the same display-frame callback:
//! - the visual cursor, updated every frame through [`CursorSpring`]
//! - the analytic channel, throttled to `analytic_rate_hz`, which is where
//!   score and transcript lookups happen
//!
//! The media element stays the source of truth: the bridge reads it every
//! frame while playing and writes it only on seek.

use super::media::MediaElement;
use super::spring::CursorSpring;
use super::state::PlaybackState;
use mirp_common::config::PlaybackConfig;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Rate limiter for the analytic channel
///
/// Intermediate samples are dropped, never queued.
#[derive(Debug, Clone)]
pub struct AnalyticThrottle {
    interval: Duration,
    last: Option<Instant>,
    running: bool,
}

impl AnalyticThrottle {
    pub fn new(rate_hz: f64) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 {
            rate_hz
        } else {
            15.0
        };
        Self {
            interval: Duration::from_secs_f64(1.0 / rate),
            last: None,
            running: false,
        }
    }

    /// Start emitting; the next poll fires immediately
    pub fn start(&mut self) {
        self.running = true;
        self.last = None;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.last = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when a sample may be taken at `now`
    pub fn poll(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Result of one display-frame tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockUpdate {
    /// Smoothed cursor position, fraction of the total duration
    pub cursor_fraction: f64,
    /// Cursor changed since the previous tick
    pub cursor_moved: bool,
    /// Time to evaluate analytic lookups at, when the throttle allowed it
    pub analytic_time: Option<f64>,
}

/// Owner of [`PlaybackState`] for one player instance
pub struct PlaybackClockBridge {
    state: PlaybackState,
    media: Option<Box<dyn MediaElement>>,
    media_duration: Option<f64>,
    /// Used as total duration while the media has none (last sample time)
    fallback_duration: f64,
    throttle: AnalyticThrottle,
    spring: CursorSpring,
    last_frame: Option<Instant>,
    last_reported: Option<f64>,
    torn_down: bool,
}

impl PlaybackClockBridge {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            state: PlaybackState::new(),
            media: None,
            media_duration: None,
            fallback_duration: 0.0,
            throttle: AnalyticThrottle::new(config.analytic_rate_hz),
            spring: CursorSpring::new(config.settle_ms, config.reduced_motion),
            last_frame: None,
            last_reported: None,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Bind the media element; state is re-read from it
    pub fn attach_media(&mut self, media: Box<dyn MediaElement>) {
        if self.torn_down {
            warn!("attach_media after teardown ignored");
            return;
        }
        self.media_duration = valid_duration(media.duration());
        self.state.cursor_time = media.current_time().max(0.0);
        self.state.live_time = self.state.cursor_time;
        self.state.is_playing = !media.is_paused();
        self.media = Some(media);

        if self.state.is_playing {
            self.throttle.start();
        } else {
            self.throttle.stop();
        }
        self.refresh_total();
        self.spring.snap_to(self.state.fraction_at(self.state.cursor_time));
        debug!(
            "Media attached (duration {:?}, playing {})",
            self.media_duration, self.state.is_playing
        );
    }

    /// No playable media: playback UI is disabled and seeks are not attempted
    pub fn is_inert(&self) -> bool {
        self.media.is_none()
    }

    /// Total duration to use while the media duration is unknown
    pub fn set_fallback_duration(&mut self, seconds: f64) {
        self.fallback_duration = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self.refresh_total();
    }

    /// Media reported its duration
    pub fn on_loaded_metadata(&mut self, duration: f64) {
        self.media_duration = valid_duration(Some(duration));
        self.refresh_total();
        self.spring
            .set_target(self.state.fraction_at(self.state.current_time()));
    }

    fn refresh_total(&mut self) {
        self.state.total_duration = self.media_duration.unwrap_or(self.fallback_duration);
    }

    pub fn total_duration(&self) -> f64 {
        self.state.total_duration
    }

    pub fn domain(&self) -> (f64, f64) {
        self.state.domain()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Media started playing
    ///
    /// # Returns
    /// `true` if this changed the play state
    pub fn on_play(&mut self) -> bool {
        let Some(media) = self.media.as_ref() else {
            return false;
        };
        if self.state.is_playing {
            return false;
        }
        self.state.is_playing = true;
        self.state.live_time = media.current_time();
        self.throttle.start();
        self.last_frame = None;
        true
    }

    /// Native time-update notification from the media element
    ///
    /// # Returns
    /// The time to run analytic lookups at, if the throttle allows a sample
    pub fn on_external_time_update(&mut self, t: f64, now: Instant) -> Option<f64> {
        if self.is_inert() || !self.state.is_playing || !t.is_finite() {
            return None;
        }
        self.state.live_time = t.max(0.0);
        self.spring.set_target(self.state.fraction_at(self.state.live_time));
        self.throttle.poll(now).then_some(self.state.live_time)
    }

    /// One display refresh
    pub fn on_display_frame(&mut self, now: Instant) -> ClockUpdate {
        let mut analytic_time = None;

        if let (true, Some(media)) = (self.state.is_playing, self.media.as_ref()) {
            self.state.live_time = media.current_time();
            self.spring.set_target(self.state.fraction_at(self.state.live_time));
            if self.throttle.poll(now) {
                analytic_time = Some(self.state.live_time);
                trace!("Analytic sample at {:.3}s", self.state.live_time);
            }
        }

        let dt = self
            .last_frame
            .map(|last| now.saturating_duration_since(last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        let fraction = self.spring.step(dt);

        if !self.state.is_playing && self.spring.is_settled() {
            // Idle until the next play or seek
            self.last_frame = None;
        }

        let cursor_moved = self.last_reported != Some(fraction);
        self.last_reported = Some(fraction);

        ClockUpdate {
            cursor_fraction: fraction,
            cursor_moved,
            analytic_time,
        }
    }

    /// Media paused at `t`: snap the cursor and stop the analytic channel
    ///
    /// # Returns
    /// The snapped cursor time
    pub fn set_paused(&mut self, t: f64) -> f64 {
        let snapped = self.state.clamp_seek(t);
        self.state.cursor_time = snapped;
        self.state.live_time = snapped;
        self.state.is_playing = false;
        self.throttle.stop();
        self.spring.set_target(self.state.fraction_at(snapped));
        snapped
    }

    /// Media paused; the exact pause time is read from the element
    pub fn on_pause(&mut self) -> Option<f64> {
        let t = self.media.as_ref()?.current_time();
        Some(self.set_paused(t))
    }

    /// Pause the media element and snap
    pub fn pause(&mut self) -> Option<f64> {
        self.media.as_mut()?.pause();
        self.on_pause()
    }

    /// Start the media element
    pub fn play(&mut self) -> bool {
        match self.media.as_mut() {
            Some(media) => media.play(),
            None => return false,
        }
        self.on_play()
    }

    /// Seek the media element; out-of-range targets are clamped
    ///
    /// The element is updated before any state here, so the next analytic
    /// sample already reads the new time.
    ///
    /// # Returns
    /// The applied target, or `None` without media
    pub fn seek(&mut self, t: f64) -> Option<f64> {
        let target = self.state.clamp_seek(t);
        self.media.as_mut()?.set_current_time(target);
        self.state.cursor_time = target;
        self.state.live_time = target;
        self.spring.set_target(self.state.fraction_at(target));
        debug!("Seek to {:.3}s", target);
        Some(target)
    }

    /// Media reached its end: rewind to 0 without resuming
    pub fn on_ended(&mut self) -> Option<f64> {
        self.media.as_ref()?;
        self.state.is_playing = false;
        self.throttle.stop();
        self.seek(0.0)
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time()
    }

    pub fn cursor_fraction(&self) -> f64 {
        self.spring.position()
    }

    pub fn configure_motion(&mut self, settle_ms: f64, reduced_motion: bool) {
        self.spring.configure(settle_ms, reduced_motion);
    }

    /// True while either clock has work to do
    pub fn needs_frame(&self) -> bool {
        !self.is_inert() && (self.state.is_playing || !self.spring.is_settled())
    }

    /// Release the media element and stop both clocks
    pub fn teardown(&mut self) {
        self.media = None;
        self.state.is_playing = false;
        self.throttle.stop();
        self.last_frame = None;
        self.torn_down = true;
    }
}

fn valid_duration(d: Option<f64>) -> Option<f64> {
    d.filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::media::{MediaCall, SimulatedMedia};

    fn config(reduced_motion: bool) -> PlaybackConfig {
        PlaybackConfig {
            reduced_motion,
            ..PlaybackConfig::default()
        }
    }

    fn bridge_with(media: &SimulatedMedia, reduced_motion: bool) -> PlaybackClockBridge {
        let mut bridge = PlaybackClockBridge::new(&config(reduced_motion));
        bridge.attach_media(Box::new(media.clone()));
        bridge
    }

    #[test]
    fn test_throttle_caps_rate() {
        let mut throttle = AnalyticThrottle::new(15.0);
        throttle.start();
        let t0 = Instant::now();
        let fired = (0..60)
            .filter(|i| throttle.poll(t0 + Duration::from_millis(i * 16)))
            .count();
        // One second of 60 Hz frames
        assert!((10..=15).contains(&fired), "fired {}", fired);
    }

    #[test]
    fn test_throttle_stopped_never_fires() {
        let mut throttle = AnalyticThrottle::new(15.0);
        assert!(!throttle.poll(Instant::now()));
        throttle.start();
        throttle.stop();
        assert!(!throttle.poll(Instant::now()));
    }

    #[test]
    fn test_without_media_everything_is_inert() {
        let mut bridge = PlaybackClockBridge::new(&config(false));
        assert!(bridge.is_inert());
        assert!(!bridge.on_play());
        assert_eq!(bridge.seek(3.0), None);
        assert_eq!(bridge.pause(), None);
        assert!(!bridge.needs_frame());
    }

    #[test]
    fn test_duration_fallback_and_metadata() {
        let media = SimulatedMedia::manual(None);
        let mut bridge = bridge_with(&media, true);
        bridge.set_fallback_duration(42.0);
        assert_eq!(bridge.total_duration(), 42.0);
        bridge.on_loaded_metadata(120.0);
        assert_eq!(bridge.total_duration(), 120.0);
        assert_eq!(bridge.domain(), (0.0, 120.0));
    }

    #[test]
    fn test_analytic_channel_only_while_playing() {
        let mut media = SimulatedMedia::manual(Some(100.0));
        let mut bridge = bridge_with(&media, true);
        let t0 = Instant::now();

        assert_eq!(bridge.on_display_frame(t0).analytic_time, None);

        media.play();
        assert!(bridge.on_play());
        media.advance(10.0);
        let update = bridge.on_display_frame(t0 + Duration::from_millis(16));
        assert_eq!(update.analytic_time, Some(10.0));
        assert_eq!(update.cursor_fraction, 0.1);

        // Next frame is within the throttle interval
        let update = bridge.on_display_frame(t0 + Duration::from_millis(32));
        assert_eq!(update.analytic_time, None);
    }

    #[test]
    fn test_pause_snaps_to_media_time() {
        let mut media = SimulatedMedia::manual(Some(100.0));
        let mut bridge = bridge_with(&media, true);
        media.play();
        bridge.on_play();
        media.advance(12.5);
        media.pause();

        assert_eq!(bridge.on_pause(), Some(12.5));
        assert!(!bridge.is_playing());
        assert_eq!(bridge.current_time(), 12.5);
        assert_eq!(
            bridge.on_display_frame(Instant::now()).analytic_time,
            None,
            "analytic channel must stop on pause"
        );
    }

    #[test]
    fn test_seek_clamps_and_writes_media_first() {
        let media = SimulatedMedia::manual(Some(60.0));
        let mut bridge = bridge_with(&media, true);
        assert_eq!(bridge.seek(90.0), Some(60.0));
        assert_eq!(bridge.seek(-5.0), Some(0.0));
        assert_eq!(media.calls(), vec![MediaCall::Seek(60.0), MediaCall::Seek(0.0)]);
        assert_eq!(bridge.current_time(), 0.0);
    }

    #[test]
    fn test_ended_rewinds_without_resume() {
        let mut media = SimulatedMedia::manual(Some(5.0));
        let mut bridge = bridge_with(&media, true);
        media.play();
        bridge.on_play();
        media.advance(6.0);

        assert_eq!(bridge.on_ended(), Some(0.0));
        assert!(!bridge.is_playing());
        assert_eq!(media.current_time(), 0.0);
        assert_eq!(media.count_calls(|c| *c == MediaCall::Play), 1);
    }

    #[test]
    fn test_spring_smooths_cursor() {
        let mut media = SimulatedMedia::manual(Some(10.0));
        let mut bridge = bridge_with(&media, false);
        media.play();
        bridge.on_play();
        let t0 = Instant::now();
        bridge.on_display_frame(t0);
        media.advance(5.0);
        let update = bridge.on_display_frame(t0 + Duration::from_millis(16));
        assert!(update.cursor_fraction > 0.0 && update.cursor_fraction < 0.5);
        assert!(update.cursor_moved);
    }

    #[test]
    fn test_needs_frame_until_settled_after_pause() {
        let mut media = SimulatedMedia::manual(Some(10.0));
        let mut bridge = bridge_with(&media, false);
        bridge.seek(5.0);
        assert!(bridge.needs_frame());

        let t0 = Instant::now();
        bridge.on_display_frame(t0);
        bridge.on_display_frame(t0 + Duration::from_secs(1));
        assert!(!bridge.needs_frame());
        assert_eq!(bridge.cursor_fraction(), 0.5);

        media.play();
        bridge.on_play();
        assert!(bridge.needs_frame());
    }

    #[test]
    fn test_teardown_releases_media() {
        let mut media = SimulatedMedia::manual(Some(10.0));
        let mut bridge = bridge_with(&media, true);
        media.play();
        bridge.on_play();
        bridge.teardown();
        assert!(bridge.is_inert());
        assert!(!bridge.needs_frame());
        assert_eq!(bridge.seek(1.0), None);
        bridge.attach_media(Box::new(media.clone()));
        assert!(bridge.is_inert());
    }
}

//! Media element seam
//!
//! The media resource is the single source of truth for "true" time. The
//! core only reads or sets it through [`MediaElement`]; the embedding layer
//! forwards the element's lifecycle notifications as [`MediaEvent`]s.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// A seekable, playable media resource
pub trait MediaElement: Send {
    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Move the playback position (seconds)
    fn set_current_time(&mut self, t: f64);

    /// Total duration once metadata is known
    fn duration(&self) -> Option<f64>;

    fn is_paused(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);
}

/// Lifecycle notifications from the media element
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MediaEvent {
    /// Duration became known
    LoadedMetadata { duration: f64 },
    Play,
    Pause,
    Ended,
}

/// Calls the core made on a [`SimulatedMedia`], in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaCall {
    Play,
    Pause,
    Seek(f64),
}

#[derive(Debug)]
enum SimClock {
    /// Position advances with wall-clock time while playing
    Wall { since: Option<Instant> },
    /// Position only moves through [`SimulatedMedia::advance`]
    Manual,
}

#[derive(Debug)]
struct SimInner {
    duration: Option<f64>,
    position: f64,
    paused: bool,
    clock: SimClock,
    calls: Vec<MediaCall>,
}

impl SimInner {
    fn now_position(&self) -> f64 {
        let mut pos = self.position;
        if let SimClock::Wall { since: Some(start) } = self.clock {
            pos += start.elapsed().as_secs_f64();
        }
        match self.duration {
            Some(d) => pos.min(d),
            None => pos,
        }
    }

    /// Fold elapsed wall time into `position`
    fn settle(&mut self) {
        self.position = self.now_position();
        if let SimClock::Wall { since } = &mut self.clock {
            *since = if self.paused { None } else { Some(Instant::now()) };
        }
    }
}

/// In-process media element used by the CLI and tests
///
/// Cloning yields another handle to the same element, so a test can keep
/// one handle for assertions while the session owns another.
#[derive(Debug, Clone)]
pub struct SimulatedMedia {
    inner: Arc<Mutex<SimInner>>,
}

impl SimulatedMedia {
    /// Element driven by wall-clock time
    pub fn new(duration: Option<f64>) -> Self {
        Self::with_clock(duration, SimClock::Wall { since: None })
    }

    /// Element whose position only moves through [`advance`](Self::advance)
    pub fn manual(duration: Option<f64>) -> Self {
        Self::with_clock(duration, SimClock::Manual)
    }

    fn with_clock(duration: Option<f64>, clock: SimClock) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimInner {
                duration: duration.filter(|d| d.is_finite() && *d > 0.0),
                position: 0.0,
                paused: true,
                clock,
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Move a manual element forward while it is playing
    ///
    /// # Returns
    /// `true` when the element reached its end during this step
    pub fn advance(&self, dt: f64) -> bool {
        let mut inner = self.lock();
        if inner.paused || !matches!(inner.clock, SimClock::Manual) {
            return false;
        }
        inner.position += dt.max(0.0);
        let duration = inner.duration;
        match duration {
            Some(d) if inner.position >= d => {
                inner.position = d;
                inner.paused = true;
                true
            }
            _ => false,
        }
    }

    /// True once a playing element has reached its duration
    pub fn is_ended(&self) -> bool {
        let inner = self.lock();
        matches!(inner.duration, Some(d) if inner.now_position() >= d)
    }

    pub fn set_duration(&self, duration: f64) {
        self.lock().duration = Some(duration).filter(|d| d.is_finite() && *d > 0.0);
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<MediaCall> {
        self.lock().calls.clone()
    }

    pub fn count_calls(&self, pred: impl Fn(&MediaCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.lock().now_position()
    }

    fn set_current_time(&mut self, t: f64) {
        let mut inner = self.lock();
        inner.settle();
        let upper = inner.duration.unwrap_or(f64::INFINITY);
        inner.position = t.clamp(0.0, upper);
        inner.calls.push(MediaCall::Seek(t));
    }

    fn duration(&self) -> Option<f64> {
        self.lock().duration
    }

    fn is_paused(&self) -> bool {
        self.lock().paused
    }

    fn play(&mut self) {
        let mut inner = self.lock();
        inner.settle();
        inner.paused = false;
        inner.settle();
        inner.calls.push(MediaCall::Play);
    }

    fn pause(&mut self) {
        let mut inner = self.lock();
        inner.settle();
        inner.paused = true;
        inner.settle();
        inner.calls.push(MediaCall::Pause);
    }
}

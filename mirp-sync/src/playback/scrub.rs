//! Scrub/seek gesture state machine
//!
//! ```text
//!   Idle --press--> PointerDown --move > threshold--> Dragging
//!    ^                  |                                |
//!    +----release (tap)-+<--------------release----------+
//! ```
//!
//! The controller performs no I/O. Each input returns the [`ScrubAction`]s
//! the session must apply, in order.

use tracing::debug;

/// Gesture state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubState {
    Idle,
    /// Pressed, not yet moved past the threshold
    PointerDown { start_x: f64, was_playing: bool },
    /// Seeking on every move
    Dragging { was_playing: bool },
}

/// Side effects requested by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrubAction {
    /// Start receiving global pointer-move/up events
    AttachListeners,
    DetachListeners,
    Pause,
    Seek(f64),
    Play,
}

/// Horizontal extent of the overlay the pointer moves over, in the same
/// coordinate space as pointer X
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayBox {
    pub left: f64,
    pub width: f64,
}

impl OverlayBox {
    pub fn new(left: f64, width: f64) -> Self {
        Self { left, width }
    }
}

#[derive(Debug, Clone)]
pub struct ScrubController {
    state: ScrubState,
    threshold_px: f64,
    domain: (f64, f64),
}

impl ScrubController {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            state: ScrubState::Idle,
            threshold_px,
            domain: (0.0, 1.0),
        }
    }

    pub fn state(&self) -> ScrubState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, ScrubState::Idle)
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, ScrubState::Dragging { .. })
    }

    /// Time domain pointer X maps onto
    pub fn set_domain(&mut self, min: f64, max: f64) {
        self.domain = (min, max.max(min));
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Time under pointer X, clamped to the domain
    pub fn time_at(&self, x: f64, overlay: &OverlayBox) -> f64 {
        let (min, max) = self.domain;
        if !(overlay.width > 0.0) || !x.is_finite() {
            return min;
        }
        let fraction = ((x - overlay.left) / overlay.width).clamp(0.0, 1.0);
        min + fraction * (max - min)
    }

    /// Press over the overlay
    ///
    /// Records the start point and the play state; no seek yet. Ignored
    /// while a gesture is already in progress.
    pub fn pointer_down(&mut self, x: f64, media_playing: bool) -> Vec<ScrubAction> {
        if self.is_active() {
            return Vec::new();
        }
        self.state = ScrubState::PointerDown {
            start_x: x,
            was_playing: media_playing,
        };
        vec![ScrubAction::AttachListeners]
    }

    pub fn pointer_move(&mut self, x: f64, overlay: &OverlayBox) -> Vec<ScrubAction> {
        match self.state {
            ScrubState::Idle => Vec::new(),
            ScrubState::PointerDown {
                start_x,
                was_playing,
            } => {
                if (x - start_x).abs() <= self.threshold_px {
                    return Vec::new();
                }
                debug!("Scrub drag started (was_playing {})", was_playing);
                self.state = ScrubState::Dragging { was_playing };
                let mut actions = Vec::with_capacity(2);
                if was_playing {
                    actions.push(ScrubAction::Pause);
                }
                actions.push(ScrubAction::Seek(self.time_at(x, overlay)));
                actions
            }
            ScrubState::Dragging { .. } => vec![ScrubAction::Seek(self.time_at(x, overlay))],
        }
    }

    /// Release
    ///
    /// A drag restores the play state captured at press time; a tap seeks
    /// and plays unconditionally. `x` is `None` when the release position
    /// is unknown, in which case no final seek is issued.
    pub fn pointer_up(&mut self, x: Option<f64>, overlay: &OverlayBox) -> Vec<ScrubAction> {
        let previous = std::mem::replace(&mut self.state, ScrubState::Idle);
        let mut actions = Vec::with_capacity(3);
        match previous {
            ScrubState::Idle => return actions,
            ScrubState::Dragging { was_playing } => {
                if let Some(x) = x {
                    actions.push(ScrubAction::Seek(self.time_at(x, overlay)));
                }
                if was_playing {
                    actions.push(ScrubAction::Play);
                }
                debug!("Scrub drag released (resume {})", was_playing);
            }
            ScrubState::PointerDown { .. } => {
                if let Some(x) = x {
                    actions.push(ScrubAction::Seek(self.time_at(x, overlay)));
                }
                actions.push(ScrubAction::Play);
                debug!("Scrub tap");
            }
        }
        actions.push(ScrubAction::DetachListeners);
        actions
    }

    /// Abort the gesture without seeking or resuming (teardown)
    pub fn cancel(&mut self) -> Vec<ScrubAction> {
        if std::mem::replace(&mut self.state, ScrubState::Idle) == ScrubState::Idle {
            Vec::new()
        } else {
            vec![ScrubAction::DetachListeners]
        }
    }
}

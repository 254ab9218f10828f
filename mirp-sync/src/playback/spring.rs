//! Critically damped spring for the visual cursor
//!
//! The cursor chases its target fraction without overshoot. The spring is
//! integrated in closed form, so the result does not depend on how the
//! elapsed time is split into frames.

/// Residual below which the spring is considered at rest
const REST_POSITION: f64 = 1e-4;
const REST_VELOCITY: f64 = 1e-3;

/// `(1 + wT)e^(-wT)` is about 1% when `wT = 6.6`
const SETTLE_FACTOR: f64 = 6.6;

#[derive(Debug, Clone)]
pub struct CursorSpring {
    position: f64,
    velocity: f64,
    target: f64,
    /// Natural frequency (rad/s); `None` snaps instantly
    omega: Option<f64>,
}

impl CursorSpring {
    /// # Arguments
    /// * `settle_ms` - Time to get within ~1% of a new target
    /// * `reduced_motion` - Disable smoothing (zero-duration convergence)
    pub fn new(settle_ms: f64, reduced_motion: bool) -> Self {
        let mut spring = Self {
            position: 0.0,
            velocity: 0.0,
            target: 0.0,
            omega: None,
        };
        spring.configure(settle_ms, reduced_motion);
        spring
    }

    pub fn configure(&mut self, settle_ms: f64, reduced_motion: bool) {
        self.omega = if reduced_motion || !(settle_ms.is_finite() && settle_ms > 0.0) {
            None
        } else {
            Some(SETTLE_FACTOR / (settle_ms / 1000.0))
        };
        if self.omega.is_none() {
            self.snap_to(self.target);
        }
    }

    pub fn is_smoothing(&self) -> bool {
        self.omega.is_some()
    }

    /// Set a new target; the position follows on subsequent steps
    pub fn set_target(&mut self, target: f64) {
        self.target = clamp_fraction(target);
        if self.omega.is_none() {
            self.snap_to(self.target);
        }
    }

    /// Jump to `target` with no motion
    pub fn snap_to(&mut self, target: f64) {
        self.target = clamp_fraction(target);
        self.position = self.target;
        self.velocity = 0.0;
    }

    /// Advance by `dt` seconds and return the new position (0.0-1.0)
    pub fn step(&mut self, dt: f64) -> f64 {
        let Some(omega) = self.omega else {
            self.snap_to(self.target);
            return self.position;
        };
        if !(dt.is_finite() && dt > 0.0) {
            return self.position;
        }

        let offset = self.position - self.target;
        let decay = (-omega * dt).exp();
        let slope = self.velocity + omega * offset;
        let new_offset = (offset + slope * dt) * decay;
        self.velocity = (self.velocity - omega * slope * dt) * decay;
        self.position = clamp_fraction(self.target + new_offset);

        if self.is_settled() {
            self.position = self.target;
            self.velocity = 0.0;
        }
        self.position
    }

    pub fn is_settled(&self) -> bool {
        (self.position - self.target).abs() < REST_POSITION && self.velocity.abs() < REST_VELOCITY
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target(&self) -> f64 {
        self.target
    }
}

fn clamp_fraction(f: f64) -> f64 {
    if f.is_nan() {
        0.0
    } else {
        f.clamp(0.0, 1.0)
    }
}

//! Playback synchronisation
//!
//! Clock bridge between the media element and the analytics domain, the
//! scrub gesture controller, and the per-view session that ties them to the
//! overlay and transcript.

pub mod clock;
pub mod frame_loop;
pub mod media;
pub mod scrub;
pub mod session;
pub mod spring;
pub mod state;

pub use clock::{AnalyticThrottle, ClockUpdate, PlaybackClockBridge};
pub use frame_loop::{FrameLoop, SharedSession};
pub use media::{MediaCall, MediaElement, MediaEvent, SimulatedMedia};
pub use scrub::{OverlayBox, ScrubAction, ScrubController, ScrubState};
pub use session::{
    AnalyticReport, FrameReport, NoopListeners, PointerListenerHost, ReportSession, ReportSnapshot,
};
pub use spring::CursorSpring;
pub use state::PlaybackState;

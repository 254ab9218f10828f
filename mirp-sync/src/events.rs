//! Event types for mirp-sync
//!
//! Re-exports the shared event definitions so session code and subscribers
//! name them from one place.

pub use crate::playback::media::MediaEvent;
pub use mirp_common::events::{EventBus, PlayState, SyncEvent};

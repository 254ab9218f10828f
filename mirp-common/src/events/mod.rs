//! Event types for the MIRP sync event system
//!
//! Provides the shared event definitions and the EventBus every report
//! session publishes on. UI layers subscribe to the bus instead of being
//! re-rendered by the core.

mod playback_types;

pub use playback_types::PlayState;

use crate::model::{EmotionLabel, PlotRect};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Sync event types
///
/// Events are broadcast via EventBus and serialise with a `type` tag so they
/// can be forwarded to any external rendering layer unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// Throttled analytic sample (score badge, transcript highlight)
    ///
    /// Emitted at most `analytic_rate_hz` times per second while playing,
    /// and once for every seek or pause snap.
    AnalyticSample {
        session_id: Uuid,
        /// Time the lookups were evaluated at
        time_sec: f64,
        /// Composite or focus score (0-100, one decimal)
        score: f64,
        /// Dominant emotion label, when the series carries one
        dominant: Option<EmotionLabel>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Visual cursor position changed
    ///
    /// Emitted every display frame while the smoothed cursor is moving.
    CursorMoved {
        session_id: Uuid,
        /// Fraction of the total duration, 0.0-1.0
        fraction: f64,
    },

    /// A seek was applied to the media element
    SeekRequested {
        session_id: Uuid,
        /// Clamped target time in seconds
        target_sec: f64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Play state changed (Playing <-> Paused)
    PlayStateChanged {
        session_id: Uuid,
        old_state: PlayState,
        new_state: PlayState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The plotted data area was re-measured to a different rectangle
    PlotRectChanged { session_id: Uuid, rect: PlotRect },

    /// Active transcript segment changed (the view should scroll it into view)
    TranscriptSegmentChanged {
        session_id: Uuid,
        /// Index into the normalised segment list, None when between segments
        segment_index: Option<usize>,
    },

    /// Session torn down; no further events follow for this id
    SessionClosed {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SyncEvent {
    /// Session that produced the event
    pub fn session_id(&self) -> Uuid {
        match self {
            SyncEvent::AnalyticSample { session_id, .. }
            | SyncEvent::CursorMoved { session_id, .. }
            | SyncEvent::SeekRequested { session_id, .. }
            | SyncEvent::PlayStateChanged { session_id, .. }
            | SyncEvent::PlotRectChanged { session_id, .. }
            | SyncEvent::TranscriptSegmentChanged { session_id, .. }
            | SyncEvent::SessionClosed { session_id, .. } => *session_id,
        }
    }

    /// Short name used in log lines
    pub fn event_type(&self) -> &'static str {
        match self {
            SyncEvent::AnalyticSample { .. } => "AnalyticSample",
            SyncEvent::CursorMoved { .. } => "CursorMoved",
            SyncEvent::SeekRequested { .. } => "SeekRequested",
            SyncEvent::PlayStateChanged { .. } => "PlayStateChanged",
            SyncEvent::PlotRectChanged { .. } => "PlotRectChanged",
            SyncEvent::TranscriptSegmentChanged { .. } => "TranscriptSegmentChanged",
            SyncEvent::SessionClosed { .. } => "SessionClosed",
        }
    }
}

/// One-to-many broadcast of [`SyncEvent`]s
///
/// Thin wrapper over `tokio::sync::broadcast`. Sending never blocks and does
/// not need a runtime, so the single-threaded core can emit from inside
/// frame callbacks.
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    ///
    /// # Examples
    ///
    /// ```
    /// use mirp_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SyncEvent) -> Result<usize, broadcast::error::SendError<SyncEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Cursor and analytic updates are fire-and-forget: a report view with
    /// no badge or transcript panel attached is still valid.
    pub fn emit_lossy(&self, event: SyncEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_subscribe() {
        let bus = EventBus::new(100);
        let _rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_eventbus_emit_no_subscribers() {
        let bus = EventBus::new(10);
        let event = SyncEvent::CursorMoved {
            session_id: Uuid::new_v4(),
            fraction: 0.5,
        };

        // Should return error when no subscribers
        assert!(bus.emit(event.clone()).is_err());
        // Lossy variant swallows it
        bus.emit_lossy(event);
    }

    #[tokio::test]
    async fn test_eventbus_emit_with_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let id = Uuid::new_v4();

        let count = bus
            .emit(SyncEvent::SeekRequested {
                session_id: id,
                target_sec: 12.5,
                timestamp: chrono::Utc::now(),
            })
            .unwrap();
        assert_eq!(count, 1);

        match rx.recv().await.unwrap() {
            SyncEvent::SeekRequested {
                session_id,
                target_sec,
                ..
            } => {
                assert_eq!(session_id, id);
                assert_eq!(target_sec, 12.5);
            }
            other => panic!("Expected SeekRequested, got {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SyncEvent::TranscriptSegmentChanged {
            session_id: Uuid::nil(),
            segment_index: Some(3),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TranscriptSegmentChanged");
        assert_eq!(json["segment_index"], 3);
        assert_eq!(event.event_type(), "TranscriptSegmentChanged");
        assert_eq!(event.session_id(), Uuid::nil());
    }
}

//! Display-frame driver
//!
//! Stands in for the host's refresh callback: a tokio interval ticks the
//! shared [`ReportSession`] at the configured frame interval. Missed ticks
//! are skipped rather than bunched, and the loop exits on [`FrameLoop::stop`]
//! or once the session is closed, so no frame work runs after teardown.

use super::session::ReportSession;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Session shared between the frame loop and input handlers
pub type SharedSession = Arc<Mutex<ReportSession>>;

pub struct FrameLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl FrameLoop {
    /// Start ticking `session` every `frame_interval`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(session: SharedSession, frame_interval: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let period = frame_interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            info!("Frame loop started ({:?} per frame)", period);
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    tick = timer.tick() => {
                        let mut session = session.lock().await;
                        if session.is_closed() {
                            debug!("Session closed, frame loop exiting");
                            break;
                        }
                        session.on_paint();
                        if session.needs_frame() {
                            if let Some(report) = session.on_display_frame(tick.into_std()) {
                                trace!("Frame: cursor {:.4}", report.cursor_fraction);
                            }
                        }
                    }
                }
            }
            info!("Frame loop stopped");
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop ticking and wait for the in-flight frame to finish
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            debug!("Frame loop task ended abnormally: {}", e);
        }
    }
}

//! Report playback sync (mirp-sync) - Main entry point
//!
//! Headless driver for the interview-report playback core: prints score
//! tracks, inspects a report at a given time, or replays it against a
//! simulated media element through the display-frame loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mirp_common::config::SyncConfig;
use mirp_common::events::{EventBus, SyncEvent};
use mirp_sync::overlay::{LayoutRect, StaticLayout};
use mirp_sync::playback::{
    FrameLoop, MediaElement, MediaEvent, NoopListeners, ReportSession, SimulatedMedia,
};
use mirp_sync::{logging, ReportData, ReportSources};
use tokio::signal;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Command-line arguments for mirp-sync
#[derive(Parser, Debug)]
#[command(name = "mirp-sync")]
#[command(about = "Time-synchronised playback and scoring for interview reports")]
#[command(version)]
struct Args {
    /// Config file (falls back to MIRP_CONFIG, then the platform config dir)
    #[arg(short, long, env = "MIRP_CONFIG")]
    config: Option<PathBuf>,

    /// Emotion time-series payload
    #[arg(long)]
    emotion: Option<PathBuf>,

    /// Focus/gaze time-series payload
    #[arg(long)]
    focus: Option<PathBuf>,

    /// Transcript segments payload
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Override the frame rate used to convert frame indices to seconds
    #[arg(long)]
    fps: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the score track as JSON lines
    Scores,
    /// Print the report state at a point in time
    Inspect {
        /// Time in seconds
        #[arg(long)]
        at: f64,
    },
    /// Replay the report against a simulated media element
    Replay {
        /// Stop after this many seconds (default: the whole recording)
        #[arg(long)]
        seconds: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config loading can warn, so it runs under a temporary stderr
    // subscriber; the real one depends on the config's [logging] section
    let config = logging::with_startup_logging(std::io::stderr, || {
        let mut config = SyncConfig::load_or_default(args.config.as_deref());
        if let Some(fps) = args.fps {
            config.series.fps = fps;
            config = config.sanitized();
        }
        config
    });
    logging::init(&config.logging).context("Failed to initialize logging")?;

    info!("mirp-sync {}", build_id());

    let sources = ReportSources {
        emotion: args.emotion,
        focus: args.focus,
        transcript: args.transcript,
    };
    let data = ReportData::load(&sources, &config).context("Failed to load report payloads")?;

    match args.command {
        Command::Scores => print_scores(&data),
        Command::Inspect { at } => inspect(&data, &config, at),
        Command::Replay { seconds } => replay(&data, &config, seconds).await,
    }
}

/// Version plus whatever build metadata build.rs could collect
fn build_id() -> String {
    let mut id = format!(
        "{} ({} build, {})",
        env!("CARGO_PKG_VERSION"),
        env!("MIRP_BUILD_PROFILE"),
        env!("MIRP_BUILT_AT")
    );
    if let Some(commit) = option_env!("MIRP_GIT_COMMIT") {
        id.push_str(&format!(", commit {}", commit));
    }
    id
}

fn print_scores(data: &ReportData) -> Result<()> {
    let track = data.track();
    for sample in track.samples() {
        println!(
            "{}",
            serde_json::to_string(sample).context("Failed to encode score sample")?
        );
    }
    match data.overall_score(&track) {
        Some(score) => info!("Overall score {}", score),
        None => warn!("No score data"),
    }
    Ok(())
}

/// Chart geometry used when no renderer is attached
fn headless_layout() -> StaticLayout {
    StaticLayout::new(
        (800.0, 300.0),
        LayoutRect::new(0.0, 0.0, 800.0, 300.0),
        LayoutRect::new(36.0, 20.0, 748.0, 258.0),
    )
}

fn build_session(data: &ReportData, config: &SyncConfig, bus: Arc<EventBus>) -> ReportSession {
    let track = data.track();
    let total = track.last_time();
    let aligner = data.aligner(config, (total > 0.0).then_some(total));
    ReportSession::new(
        config,
        track,
        aligner,
        Box::new(headless_layout()),
        Box::new(NoopListeners),
        bus,
    )
}

fn inspect(data: &ReportData, config: &SyncConfig, at: f64) -> Result<()> {
    let mut session = build_session(data, config, Arc::new(EventBus::default()));
    let total = session.track().last_time();
    session.attach_media(Box::new(SimulatedMedia::manual(Some(total))));
    session.seek(at);

    let snapshot = session.snapshot();
    println!(
        "{}",
        serde_json::to_string_pretty(&snapshot).context("Failed to encode snapshot")?
    );
    session.teardown();
    Ok(())
}

async fn replay(data: &ReportData, config: &SyncConfig, seconds: Option<f64>) -> Result<()> {
    let bus = Arc::new(EventBus::new(1024));
    let session = build_session(data, config, Arc::clone(&bus));
    let total = session.track().last_time();
    if total <= 0.0 {
        warn!("Nothing to replay: report has no timed samples");
        return Ok(());
    }

    let mut rx = bus.subscribe();
    let logger = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SyncEvent::AnalyticSample {
                    time_sec,
                    score,
                    dominant,
                    ..
                }) => {
                    info!(
                        "t={:.2}s score={:.1} dominant={}",
                        time_sec,
                        score,
                        dominant.map(|d| d.as_str()).unwrap_or("-")
                    );
                }
                Ok(SyncEvent::TranscriptSegmentChanged { segment_index, .. }) => {
                    info!("Transcript segment -> {:?}", segment_index);
                }
                Ok(SyncEvent::SessionClosed { .. }) => break,
                Ok(other) => debug!("Event {}", other.event_type()),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Event logger lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut media = SimulatedMedia::new(Some(total));
    let session = Arc::new(Mutex::new(session));
    {
        let mut session = session.lock().await;
        session.attach_media(Box::new(media.clone()));
        media.play();
        session.on_media_event(MediaEvent::Play);
    }

    let frame_loop = FrameLoop::spawn(
        Arc::clone(&session),
        Duration::from_millis(config.playback.frame_interval_ms),
    );

    let limit = seconds.unwrap_or(total).clamp(0.0, total);
    info!("Replaying {:.1}s of {:.1}s", limit, total);
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs_f64(limit)) => {},
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping replay");
        },
    }

    frame_loop.stop().await;
    {
        let mut session = session.lock().await;
        if media.is_ended() {
            session.on_media_event(MediaEvent::Ended);
        }
        session.teardown();
    }
    if let Err(e) = logger.await {
        debug!("Event logger ended abnormally: {}", e);
    }

    info!("Replay complete");
    Ok(())
}

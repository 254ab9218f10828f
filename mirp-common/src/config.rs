//! Configuration loading and config-file resolution
//!
//! All tunables of the sync core live in one TOML file. Every key is
//! optional; missing keys take the compiled defaults below. A missing or
//! unreadable file is not fatal: a warning is logged and the defaults are
//! used, so a report view always comes up.
//!
//! Config file resolution priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`MIRP_CONFIG`)
//! 3. Platform config directory (`<config_dir>/mirp/config.toml`)
//! 4. Compiled defaults (no file)

use crate::time::TimeUnit;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MIRP_CONFIG";

/// How 0-1 probabilities are told apart from 0-100 percentages
///
/// Upstream analysers disagree on scale. The heuristic "every value <= 1
/// means probabilities" can be evaluated per record or once for the whole
/// series; which one is right is an open product question, so it is a knob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescalePolicy {
    /// Decide independently for every record
    #[default]
    PerRecord,
    /// Decide once: rescale only if every value of every record is <= 1
    WholeSeries,
    /// Values are always percentages
    Never,
}

/// Time-series normaliser settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Frames per second used to turn frame indices into seconds
    pub fps: f64,
    pub rescale: RescalePolicy,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            rescale: RescalePolicy::PerRecord,
        }
    }
}

/// Playback clock bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Maximum rate of the analytic channel (score / transcript lookups)
    pub analytic_rate_hz: f64,
    /// Time for the visual cursor to converge on a new target
    pub settle_ms: f64,
    /// Disable cursor smoothing entirely
    pub reduced_motion: bool,
    /// Display refresh period used by the frame loop
    pub frame_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            analytic_rate_hz: 15.0,
            settle_ms: 200.0,
            reduced_motion: false,
            frame_interval_ms: 16,
        }
    }
}

/// Scrub/seek controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// Pointer travel (px) that turns a press into a drag
    pub drag_threshold_px: f64,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: 4.0,
        }
    }
}

/// Nominal chart margins (px) used when plot geometry cannot be probed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 16.0,
            bottom: 22.0,
            left: 36.0,
        }
    }
}

impl Margins {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Overlay coordinate mapper settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub margin: Margins,
}

/// Transcript aligner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    pub time_unit: TimeUnit,
    /// Activation windows are widened by this much on both sides
    pub epsilon_sec: f64,
    /// Gap kept between a clipped segment end and the next start
    pub boundary_gap_sec: f64,
    /// Added to every segment start
    pub shave_start_sec: f64,
    /// Subtracted from every explicit segment end
    pub shave_end_sec: f64,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            time_unit: TimeUnit::Seconds,
            epsilon_sec: 0.08,
            boundary_gap_sec: 0.001,
            shave_start_sec: 0.0,
            shave_end_sec: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Complete configuration for a report session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub series: SeriesConfig,
    pub playback: PlaybackConfig,
    pub scrub: ScrubConfig,
    pub overlay: OverlayConfig,
    pub transcript: TranscriptConfig,
    pub logging: LoggingConfig,
}

impl SyncConfig {
    /// Parse TOML text and sanitise out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve and load the config, falling back to defaults on any failure
    pub fn load_or_default(cli_arg: Option<&Path>) -> Self {
        let Some(path) = resolve_config_path(cli_arg, CONFIG_ENV_VAR) else {
            info!("No config file found, using compiled defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load config {}: {}. Using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Replace values that would break the core (zero fps, zero rate, ...)
    /// with their defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = SyncConfig::default();

        if !(self.series.fps.is_finite() && self.series.fps >= 1.0) {
            warn!("Invalid series.fps {}, using {}", self.series.fps, defaults.series.fps);
            self.series.fps = defaults.series.fps;
        }
        if !(self.playback.analytic_rate_hz.is_finite() && self.playback.analytic_rate_hz > 0.0) {
            warn!(
                "Invalid playback.analytic_rate_hz {}, using {}",
                self.playback.analytic_rate_hz, defaults.playback.analytic_rate_hz
            );
            self.playback.analytic_rate_hz = defaults.playback.analytic_rate_hz;
        }
        if !(self.playback.settle_ms.is_finite() && self.playback.settle_ms >= 0.0) {
            self.playback.settle_ms = defaults.playback.settle_ms;
        }
        if self.playback.frame_interval_ms == 0 {
            self.playback.frame_interval_ms = defaults.playback.frame_interval_ms;
        }
        if !(self.scrub.drag_threshold_px.is_finite() && self.scrub.drag_threshold_px >= 0.0) {
            self.scrub.drag_threshold_px = defaults.scrub.drag_threshold_px;
        }
        if !(self.transcript.epsilon_sec.is_finite() && self.transcript.epsilon_sec >= 0.0) {
            self.transcript.epsilon_sec = defaults.transcript.epsilon_sec;
        }
        if !(self.transcript.boundary_gap_sec.is_finite() && self.transcript.boundary_gap_sec >= 0.0)
        {
            self.transcript.boundary_gap_sec = defaults.transcript.boundary_gap_sec;
        }
        self
    }
}

/// Resolve the config file path
///
/// Returns `None` when no candidate exists; an explicit CLI or environment
/// path is returned even if it does not exist so the caller can report it.
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_file().filter(|p| p.exists())
}

/// Platform default config file location
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mirp").join("config.toml"))
}

//! Tracing setup for the mirp-sync binary
//!
//! The config file decides the log level and an optional log file, but
//! loading it can itself warn (unreadable file, out-of-range values). Config
//! loading therefore runs under a scoped stderr subscriber
//! ([`with_startup_logging`]); the process-wide subscriber is installed
//! afterwards from the loaded [`LoggingConfig`] ([`init`]).

use crate::{Error, Result};
use mirp_common::config::LoggingConfig;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used before the config file has been read
pub const STARTUP_LEVEL: &str = "info";

/// Filter directives for the workspace crates at `level`
pub fn default_directives(level: &str) -> String {
    format!("mirp_sync={level},mirp_common={level}")
}

/// `RUST_LOG` when set, else the workspace crates at `level`
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Run `f` with a temporary subscriber writing to `make_writer`
///
/// Used for everything that happens before [`init`]; the subscriber is
/// dropped when `f` returns.
pub fn with_startup_logging<W, T>(make_writer: W, f: impl FnOnce() -> T) -> T
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry()
        .with(env_filter(STARTUP_LEVEL))
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer));
    tracing::subscriber::with_default(subscriber, f)
}

/// Open the log file for appending, creating missing parent directories
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Install the process-wide subscriber
///
/// Events go to `config.file` when it is set and can be opened, otherwise
/// to stderr. `RUST_LOG` overrides `config.level`. Fails only when a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let mut open_error = None;
    let file = config
        .file
        .as_deref()
        .and_then(|path| match open_log_file(path) {
            Ok(file) => Some(file),
            Err(e) => {
                open_error = Some(format!("{}: {}", path.display(), e));
                None
            }
        });

    let stderr_layer = file
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let file_layer = file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::InvalidState(format!("tracing already initialised: {}", e)))?;

    match (open_error, &config.file) {
        (Some(e), _) => warn!("Cannot open log file {}. Logging to stderr", e),
        (None, Some(path)) => info!("Logging to {}", path.display()),
        (None, None) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("debug"), "mirp_sync=debug,mirp_common=debug");
    }

    #[test]
    fn test_open_log_file_creates_parents_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("mirp.log");

        use std::io::Write;
        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "first\nsecond\n");
    }
}

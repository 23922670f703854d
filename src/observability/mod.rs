//! Logging setup
//!
//! One `tracing` subscriber per process. The console layer is filtered by
//! `RUST_LOG` when set and by the configured filter otherwise; JSON output is
//! available for log shippers. An optional file layer writes debug-level logs
//! to daily-rotated files, keeping the last [`MAX_LOG_FILES`].

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const LOG_FILE_PREFIX: &str = "storage";
pub const MAX_LOG_FILES: usize = 10;

const FILE_FILTER: &str = "hashvault=debug,tower_http=debug";

/// Build the filter: `RUST_LOG` wins over `fallback`
pub fn build_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Open the rotating appender under `dir`, creating it if needed
pub fn rolling_file(dir: &Path) -> io::Result<RollingFileAppender> {
    fs::create_dir_all(dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Returned by [`init_tracing`]. Dropping it flushes and stops the file writer.
#[must_use]
pub struct LogGuard {
    installed: bool,
    _file: Option<WorkerGuard>,
}

impl LogGuard {
    /// False when a subscriber was already installed (e.g. by a test)
    pub fn installed(&self) -> bool {
        self.installed
    }
}

/// Install the global subscriber
pub fn init_tracing(
    fallback_filter: &str,
    json: bool,
    log_dir: Option<&Path>,
) -> io::Result<LogGuard> {
    let console = if json {
        fmt::layer()
            .json()
            .with_filter(build_filter(fallback_filter))
            .boxed()
    } else {
        fmt::layer()
            .with_filter(build_filter(fallback_filter))
            .boxed()
    };

    let (file, guard) = match log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(rolling_file(dir)?);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(FILE_FILTER))
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let installed = tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .is_ok();

    Ok(LogGuard {
        installed,
        _file: guard,
    })
}

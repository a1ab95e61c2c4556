//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to a daily-rotated file so command output on stdout stays clean.
//! Every session operation runs inside a span carrying its arguments.

use std::path::PathBuf;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "jira_session=info,warn";

/// File name prefix for rotated log files.
const LOG_FILE_PREFIX: &str = "jira-session.log";

/// Initialize the logging system.
///
/// Sets up tracing with:
/// - Daily rotating file appender in the user's local data directory
/// - Log level configuration via `RUST_LOG` environment variable
/// - A compact stderr layer as well when `verbose` is set
///
/// # Log Directory
///
/// - Linux: `~/.local/share/jira-session/logs/`
/// - macOS: `~/Library/Application Support/jira-session/logs/`
/// - Windows: `C:\Users\<User>\AppData\Local\jira-session\logs\`
///
/// # Log Levels
///
/// - `RUST_LOG=jira_session=debug` - every request and its outcome
/// - `RUST_LOG=jira_session=trace` - very verbose
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// jira_session::logging::init(false).expect("Failed to initialize logging");
/// ```
pub fn init(verbose: bool) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(stderr_layer)
        .with(filter);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jira-session starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

/// Get the log directory path.
///
/// Returns the platform-specific local data directory with `jira-session/logs` appended.
fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jira-session").join("logs"))
}

/// Get the path where logs are stored, for telling users where to look.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

/// Log application shutdown.
///
/// Call this before the application exits to log a clean shutdown message.
pub fn shutdown() {
    tracing::info!("jira-session shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory_layout() {
        let dir = log_directory().unwrap();
        assert!(dir.ends_with("jira-session/logs"));
        assert_eq!(Some(dir), get_log_directory().ok());
    }
}

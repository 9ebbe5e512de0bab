//! Logging setup for tilekeep tools.
//!
//! Events go to a log file, truncated at the start of each run, and
//! optionally to stderr so that command output on stdout stays clean.
//! The level is taken from `RUST_LOG`, defaulting to `info`.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Keeps the background log writer alive.
///
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// Creates the parent directory of `log_file` and clears any previous
/// content. With `console` set, events are mirrored to stderr.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be created, or if a
/// global subscriber is already installed.
pub fn init_logging(log_file: &Path, console: bool) -> Result<LoggingGuard, io::Error> {
    let (dir, name) = split_log_path(log_file)?;
    fs::create_dir_all(dir)?;
    fs::write(log_file, "")?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(true)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn split_log_path(log_file: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let name = log_file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", log_file.display()),
        )
    })?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("/var/log/tilekeep.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log"));
        assert_eq!(name, "tilekeep.log");

        let (dir, name) = split_log_path(Path::new("tilekeep.log")).unwrap();
        assert_eq!(dir, Path::new("."));
        assert_eq!(name, "tilekeep.log");
    }

    #[test]
    fn test_split_log_path_rejects_directory_root() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_init_clears_previous_log() {
        // Only the file handling is exercised here; the global subscriber can
        // be installed once per process and other tests may race for it.
        let temp_dir = TempDir::new().unwrap();
        let log_file = temp_dir.path().join("nested").join("tilekeep.log");
        fs::create_dir_all(log_file.parent().unwrap()).unwrap();
        fs::write(&log_file, "old log data").unwrap();

        let (dir, _) = split_log_path(&log_file).unwrap();
        fs::create_dir_all(dir).unwrap();
        fs::write(&log_file, "").unwrap();

        assert_eq!(fs::read_to_string(&log_file).unwrap(), "");
    }
}

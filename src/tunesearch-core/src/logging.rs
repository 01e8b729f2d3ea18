use crate::{config::LoggingConfig, paths::AppDirs};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILE: &str = "tunesearch.log";

/// Keeps the background file writer alive; drop it last.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Installs the global subscriber.
///
/// Logs always go to a daily rolling file under the log dir. They are mirrored
/// to stdout only when the config allows it *and* `console` is true; the
/// terminal screen passes `false` so log lines never land on top of it.
pub fn init_logging(
    config: &LoggingConfig,
    dirs: &AppDirs,
    console: bool,
) -> Result<LoggingGuard, LoggingError> {
    let log_dir = dirs.log_dir().to_path_buf();
    fs::create_dir_all(&log_dir).map_err(|source| LoggingError::CreateDirectory {
        path: log_dir.clone(),
        source,
    })?;

    let env_filter = EnvFilter::try_new(config.level.as_filter_directive()).map_err(|source| {
        LoggingError::ParseLevel {
            level: config.level.as_filter_directive().to_string(),
            source,
        }
    })?;

    let file_stem = config.file_name.as_deref().unwrap_or(DEFAULT_LOG_FILE);
    cleanup_old_logs(&log_dir, file_stem, config.max_log_files.max(1))?;
    let appender = tracing_appender::rolling::daily(&log_dir, file_stem);
    let (file, file_guard) = tracing_appender::non_blocking(appender);

    let to_stdout = config.stdout && console;
    let writer = if to_stdout {
        BoxMakeWriter::new(std::io::stdout.and(file))
    } else {
        BoxMakeWriter::new(file)
    };

    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(to_stdout)
        .with_writer(writer)
        .try_init()
        .map_err(LoggingError::SubscriberInstall)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn cleanup_old_logs(dir: &Path, file_stem: &str, max_files: usize) -> Result<(), LoggingError> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(file_stem) {
                entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .map(|mtime| (entry.path(), mtime))
            } else {
                None
            }
        })
        .collect();

    entries.sort_by_key(|(_, modified)| *modified);
    if entries.len() <= max_files {
        return Ok(());
    }

    let remove_count = entries.len() - max_files;
    for (path, _) in entries.into_iter().take(remove_count) {
        fs::remove_file(&path).map_err(|source| LoggingError::Cleanup { path, source })?;
    }

    Ok(())
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse log level {level}: {source}")]
    ParseLevel {
        level: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("failed to install tracing subscriber: {0}")]
    SubscriberInstall(Box<dyn std::error::Error + Send + Sync>),
    #[error("failed to list log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to remove old log file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn filter_directive_is_lowercase() {
        assert_eq!(LogLevel::Info.as_filter_directive(), "info");
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        for (offset, day) in ["2026-01-01", "2026-01-02", "2026-01-03"].iter().enumerate() {
            let path = dir.path().join(format!("{DEFAULT_LOG_FILE}.{day}"));
            fs::write(&path, day).expect("write log");
            let mtime = std::time::SystemTime::UNIX_EPOCH
                + std::time::Duration::from_secs(1_000_000 + offset as u64 * 86_400);
            fs::File::options()
                .write(true)
                .open(&path)
                .and_then(|f| f.set_modified(mtime))
                .expect("set mtime");
        }
        fs::write(dir.path().join("unrelated.txt"), "keep").expect("write other");

        cleanup_old_logs(dir.path(), DEFAULT_LOG_FILE, 2).expect("cleanup");

        let mut remaining: Vec<_> = fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        remaining.sort();
        assert_eq!(
            remaining,
            vec![
                format!("{DEFAULT_LOG_FILE}.2026-01-02"),
                format!("{DEFAULT_LOG_FILE}.2026-01-03"),
                "unrelated.txt".to_string(),
            ]
        );
    }
}

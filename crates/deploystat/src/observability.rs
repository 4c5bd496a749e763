//! Logging setup.
//!
//! Events go to a daily-rolled JSON-lines file through `tracing-appender`.
//! Nothing here writes to stdout: it carries command output, `--json`
//! included. When no log file can be opened, logs fall back to stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

const ENV_LOG_PATH: &str = "DEPLOYSTAT_LOG_PATH";
const ENV_LOG_DIR: &str = "DEPLOYSTAT_LOG_DIR";
const LOG_FILE_NAME: &str = concat!(env!("CARGO_PKG_NAME"), ".jsonl");

/// Install the global subscriber.
///
/// `config_dir` is the `log_dir` config value. Hold the returned guard until
/// exit so buffered lines are flushed.
pub fn init(config_dir: Option<&Path>, filter: EnvFilter) -> Result<WorkerGuard> {
    let (writer, guard) = match LogFile::resolve(config_dir) {
        Ok(file) => tracing_appender::non_blocking(file.appender()),
        Err(reason) => {
            eprintln!("warning: {reason}; logging to stderr");
            tracing_appender::non_blocking(std::io::stderr())
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer(writer))
        .try_init()?;

    tracing::debug!("logging initialized");
    Ok(guard)
}

/// Build an `EnvFilter` based on CLI flags and environment.
///
/// Priority: quiet flag > verbose flag > RUST_LOG env > default_level
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 1) => EnvFilter::new("debug"),
        (false, 2..) => EnvFilter::new("trace"),
        (false, 0) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
    }
}

/// One JSON object per event, with event fields at the top level and the
/// innermost span under `span`.
fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .with_span_list(false)
        .with_writer(writer)
}

/// The file log lines are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogFile {
    dir: PathBuf,
    file_name: String,
}

impl LogFile {
    fn resolve(config_dir: Option<&Path>) -> Result<Self, String> {
        Self::resolve_with(
            std::env::var_os(ENV_LOG_PATH).map(PathBuf::from),
            std::env::var_os(ENV_LOG_DIR).map(PathBuf::from),
            config_dir.map(Path::to_path_buf),
        )
    }

    /// Explicit path, then explicit directory, then the configured
    /// directory. With none of those, the first writable default wins.
    fn resolve_with(
        path: Option<PathBuf>,
        dir: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self, String> {
        if let Some(path) = path {
            return Self::at_path(&path);
        }
        if let Some(dir) = dir.or(config_dir) {
            return Self::in_dir(dir);
        }

        default_dirs()
            .into_iter()
            .find_map(|dir| Self::in_dir(dir).ok())
            .ok_or_else(|| "no writable log directory found".to_string())
    }

    fn in_dir(dir: PathBuf) -> Result<Self, String> {
        let file = Self {
            dir,
            file_name: LOG_FILE_NAME.to_string(),
        };
        file.check_writable()?;
        Ok(file)
    }

    fn at_path(path: &Path) -> Result<Self, String> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| format!("{ENV_LOG_PATH} must end in a UTF-8 file name"))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let file = Self {
            dir: dir.to_path_buf(),
            file_name: file_name.to_string(),
        };
        file.check_writable()?;
        Ok(file)
    }

    fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    fn check_writable(&self) -> Result<(), String> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("cannot create log directory {}: {e}", self.dir.display()))?;
        let path = self.path();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| format!("cannot open log file {}: {e}", path.display()))?;
        Ok(())
    }

    fn appender(&self) -> tracing_appender::rolling::RollingFileAppender {
        tracing_appender::rolling::daily(&self.dir, &self.file_name)
    }
}

/// Per-user data directory, then the system temp directory. Logs never land
/// in the working tree being inspected.
fn default_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", env!("CARGO_PKG_NAME")) {
        dirs.push(proj_dirs.data_local_dir().join("logs"));
    }
    dirs.push(std::env::temp_dir().join(env!("CARGO_PKG_NAME")));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[test]
    fn env_filter_quiet_overrides() {
        assert_eq!(env_filter(true, 2, "info").to_string(), "error");
    }

    #[test]
    fn env_filter_verbose_maps_to_debug_and_trace() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 2, "info").to_string(), "trace");
        assert_eq!(env_filter(false, 5, "info").to_string(), "trace");
    }

    #[test]
    fn explicit_path_wins() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("custom.jsonl");
        let other = tmp.path().join("other");

        let file = LogFile::resolve_with(Some(path.clone()), Some(other), None).unwrap();
        assert_eq!(file.path(), path);
        assert!(path.is_file());
    }

    #[test]
    fn env_dir_beats_config_dir() {
        let tmp = TempDir::new().unwrap();
        let env_dir = tmp.path().join("env");
        let config_dir = tmp.path().join("config");

        let env = Some(env_dir.clone());
        let file = LogFile::resolve_with(None, env, Some(config_dir.clone())).unwrap();
        assert_eq!(file.dir, env_dir);
        assert_eq!(file.file_name, LOG_FILE_NAME);
        assert!(!config_dir.exists());

        let file = LogFile::resolve_with(None, None, Some(config_dir.clone())).unwrap();
        assert_eq!(file.dir, config_dir);
    }

    #[test]
    fn unwritable_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let err = LogFile::resolve_with(None, Some(blocker.join("logs")), None).unwrap_err();
        assert!(err.contains("cannot create log directory"));
    }

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn json_layer_writes_span_and_event_fields() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::registry().with(json_layer(buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("cmd_status", json_output = true);
            let _entered = span.enter();
            tracing::warn!(query = "history", count = 3_u64, "git query failed");
        });

        let bytes = buffer.0.lock().unwrap().clone();
        let line = String::from_utf8(bytes).unwrap();
        let entry: Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(entry["level"], "WARN");
        assert_eq!(entry["query"], "history");
        assert_eq!(entry["count"], 3);
        assert_eq!(entry["message"], "git query failed");
        assert_eq!(entry["span"]["name"], "cmd_status");
        assert_eq!(entry["span"]["json_output"], true);
        assert!(entry["timestamp"].is_string());
    }
}

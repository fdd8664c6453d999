use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::models::ActivityLogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogScope {
    Streaming,
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogPhase {
    Request,
    Response,
    Error,
}

/// One audit record: a request, response, or error event for a proxied call.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEvent {
    pub scope: LogScope,
    pub phase: LogPhase,
    pub method: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
struct ActivityLine<'a> {
    timestamp: String,
    source: &'static str,
    #[serde(flatten)]
    event: &'a ActivityEvent,
}

/// Append-only, best-effort, size-rotated JSONL audit sink.
///
/// Never on the critical path: `record` hands the write to a blocking task
/// and every failure is swallowed. Diagnostics must not fail the proxied
/// request.
pub struct ActivityLogger {
    config: ActivityLogConfig,
}

impl ActivityLogger {
    pub fn new(config: ActivityLogConfig) -> Self {
        Self { config }
    }

    /// Record an event. Fire-and-forget; errors are traced at debug level
    /// and otherwise ignored.
    pub fn record(&self, event: ActivityEvent) {
        if !self.config.enabled {
            return;
        }

        let line = ActivityLine {
            timestamp: chrono::Utc::now().to_rfc3339(),
            source: "proxy",
            event: &event,
        };
        let line = match serde_json::to_string(&line) {
            Ok(line) => line,
            Err(e) => {
                tracing::debug!("[Activity-Log] Failed to serialize event: {}", e);
                return;
            }
        };

        let config = self.config.clone();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn_blocking(move || {
                if let Err(e) = append_line(&config, &line) {
                    tracing::debug!("[Activity-Log] Write failed: {}", e);
                }
            });
        } else if let Err(e) = append_line(&config, &line) {
            tracing::debug!("[Activity-Log] Write failed: {}", e);
        }
    }
}

fn log_path(config: &ActivityLogConfig) -> PathBuf {
    config.dir.join(&config.file)
}

fn backup_path(config: &ActivityLogConfig, index: usize) -> PathBuf {
    config.dir.join(format!("{}.{}", config.file, index))
}

pub(crate) fn append_line(config: &ActivityLogConfig, line: &str) -> std::io::Result<()> {
    fs::create_dir_all(&config.dir)?;
    rotate_if_needed(config)?;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(config))?;
    writeln!(file, "{}", line)
}

/// Shift `file -> file.1 -> file.2 ...` once the active file crosses the
/// size threshold, dropping generations beyond the configured backup count.
/// With zero backups the file is truncated in place.
fn rotate_if_needed(config: &ActivityLogConfig) -> std::io::Result<()> {
    if config.max_bytes == 0 {
        return Ok(());
    }
    let path = log_path(config);
    let size = match fs::metadata(&path) {
        Ok(meta) => meta.len(),
        Err(_) => return Ok(()),
    };
    if size < config.max_bytes {
        return Ok(());
    }

    if config.backups == 0 {
        let file = fs::OpenOptions::new().write(true).open(&path)?;
        file.set_len(0)?;
        return Ok(());
    }

    for index in (1..config.backups).rev() {
        let src = backup_path(config, index);
        let dest = backup_path(config, index + 1);
        if src.exists() {
            fs::rename(&src, &dest)?;
        }
    }
    fs::rename(&path, backup_path(config, 1))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir, max_bytes: u64, backups: usize) -> ActivityLogConfig {
        ActivityLogConfig {
            enabled: true,
            dir: dir.path().to_path_buf(),
            file: "activity.jsonl".to_string(),
            max_bytes,
            backups,
        }
    }

    fn event() -> ActivityEvent {
        ActivityEvent {
            scope: LogScope::Streaming,
            phase: LogPhase::Request,
            method: "POST".to_string(),
            url: "http://stream/threads/abc/runs".to_string(),
            status: None,
            duration_ms: None,
            message: None,
        }
    }

    #[test]
    fn appends_jsonl_lines() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, 1024 * 1024, 1);

        append_line(&cfg, &serde_json::to_string(&event()).unwrap()).unwrap();
        append_line(&cfg, &serde_json::to_string(&event()).unwrap()).unwrap();

        let content = fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 2);
        let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["scope"], "streaming");
        assert_eq!(first["phase"], "request");
    }

    #[test]
    fn rotates_at_threshold_keeping_bounded_backups() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, 64, 2);

        // Each write lands ~100 bytes, tripping rotation on the next call.
        for _ in 0..4 {
            append_line(&cfg, &"x".repeat(100)).unwrap();
        }

        assert!(dir.path().join("activity.jsonl").exists());
        assert!(dir.path().join("activity.jsonl.1").exists());
        assert!(dir.path().join("activity.jsonl.2").exists());
        assert!(!dir.path().join("activity.jsonl.3").exists());
    }

    #[test]
    fn zero_backups_truncates_in_place() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir, 16, 0);

        append_line(&cfg, &"x".repeat(64)).unwrap();
        append_line(&cfg, "after-truncate").unwrap();

        let content = fs::read_to_string(dir.path().join("activity.jsonl")).unwrap();
        assert_eq!(content.trim(), "after-truncate");
        assert!(!dir.path().join("activity.jsonl.1").exists());
    }

    #[tokio::test]
    async fn disabled_logger_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir, 1024, 1);
        cfg.enabled = false;

        let logger = ActivityLogger::new(cfg);
        logger.record(event());
        tokio::task::yield_now().await;

        assert!(!dir.path().join("activity.jsonl").exists());
    }
}

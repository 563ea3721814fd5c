//! FileSink - appends routed events to a JSON-lines file

use contracts::{ContractError, EventSink, LogEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output file; parent directories are created
    pub path: PathBuf,
    /// Append to an existing file instead of truncating it
    pub append: bool,
}

impl FileSinkConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: true,
        }
    }

    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./routed.jsonl"));
        let append = params
            .get("append")
            .map(|v| v != "false")
            .unwrap_or(true);

        Self { path, append }
    }
}

/// Sink that writes one JSON object per event
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl FileSink {
    /// Create a new FileSink, opening the file immediately
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if config.append {
            options.append(true);
        } else {
            options.write(true).truncate(true);
        }
        let file = options.open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: Mutex::new(Some(BufWriter::new(file))),
        })
    }

    /// Create from a `path` / `append` parameter map
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.config.path
    }

    fn write_event(&self, event: &LogEvent) -> std::io::Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard
            .as_mut()
            .ok_or_else(|| std::io::Error::other("sink is closed"))?;
        serde_json::to_writer(&mut *writer, event)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")
    }

    fn write_failed(&self, e: std::io::Error) -> ContractError {
        error!(sink = %self.name, path = %self.config.path.display(), error = %e, "Write failed");
        ContractError::sink_write(&self.name, e.to_string())
    }
}

impl EventSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, event: &LogEvent) -> Result<(), ContractError> {
        self.write_event(event).map_err(|e| self.write_failed(e))
    }

    #[instrument(name = "file_sink_flush", skip(self), fields(sink = %self.name))]
    fn flush(&self) -> Result<(), ContractError> {
        match self.writer.lock().as_mut() {
            Some(writer) => writer.flush().map_err(|e| self.write_failed(e)),
            None => Ok(()),
        }
    }

    #[instrument(name = "file_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&self) -> Result<(), ContractError> {
        if let Some(mut writer) = self.writer.lock().take() {
            writer.flush().map_err(|e| self.write_failed(e))?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_file_sink_writes_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out").join("a.jsonl");
        let sink = FileSink::new("file_a", FileSinkConfig::new(&path)).unwrap();

        sink.emit(&LogEvent::new(LogLevel::Warning, "first").with_property("n", 1i64))
            .unwrap();
        sink.emit(&LogEvent::new(LogLevel::Error, "second")).unwrap();
        sink.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let events: Vec<LogEvent> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, LogLevel::Warning);
        assert_eq!(events[1].message_template.text(), "second");
    }

    #[test]
    fn test_emit_after_close_fails() {
        let dir = tempdir().unwrap();
        let sink = FileSink::new("file", FileSinkConfig::new(dir.path().join("x.jsonl"))).unwrap();
        sink.close().unwrap();
        // second close is a no-op
        sink.close().unwrap();

        let err = sink
            .emit(&LogEvent::new(LogLevel::Information, "late"))
            .unwrap_err();
        assert!(matches!(err, ContractError::SinkWrite { .. }));
    }

    #[test]
    fn test_config_from_params() {
        let params = HashMap::from([
            ("path".to_string(), "/tmp/b.jsonl".to_string()),
            ("append".to_string(), "false".to_string()),
        ]);
        let config = FileSinkConfig::from_params(&params);
        assert_eq!(config.path, PathBuf::from("/tmp/b.jsonl"));
        assert!(!config.append);

        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("c.jsonl");
        let params = HashMap::from([("path".to_string(), path.display().to_string())]);
        let sink = FileSink::from_params("c", &params).unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
    }
}

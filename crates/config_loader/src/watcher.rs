//! FileOptionsWatcher - reloads a config file when its content changes

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::ContractError;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::{ConfigLoader, OptionsMonitor};

/// Default polling interval
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Longest single sleep, so `stop` returns promptly
const STOP_CHECK_STEP: Duration = Duration::from_millis(25);

/// Background thread that polls one config file
///
/// On a content change the file is reloaded and pushed into the monitor.
/// A file that fails to load is logged and the previous options stay in
/// effect.
pub struct FileOptionsWatcher {
    path: PathBuf,
    stop: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl FileOptionsWatcher {
    /// Load `path` once, then keep watching it
    ///
    /// # Errors
    /// The initial load must succeed.
    pub fn watch(
        path: impl Into<PathBuf>,
        interval: Duration,
    ) -> Result<(OptionsMonitor, Self), ContractError> {
        let path = path.into();
        let initial = ConfigLoader::load_from_path(&path)?;
        let monitor = OptionsMonitor::new(initial);
        let watcher = Self::spawn(path, monitor.clone(), interval)?;
        Ok((monitor, watcher))
    }

    /// Start polling `path`, pushing changes into `monitor`
    pub fn spawn(
        path: impl Into<PathBuf>,
        monitor: OptionsMonitor,
        interval: Duration,
    ) -> Result<Self, ContractError> {
        let path = path.into();
        let stop = Arc::new(AtomicBool::new(false));

        let mut poller = Poller {
            path: path.clone(),
            last_content: std::fs::read_to_string(&path).ok(),
            monitor,
        };
        let stop_flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("options-watcher".to_string())
            .spawn(move || {
                info!(path = %poller.path.display(), "Config watcher started");
                while sleep_unless_stopped(&stop_flag, interval) {
                    poller.poll();
                }
                debug!(path = %poller.path.display(), "Config watcher stopped");
            })?;

        Ok(Self {
            path,
            stop,
            handle: Mutex::new(Some(handle)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_running(&self) -> bool {
        !self.stop.load(Ordering::Acquire)
    }

    /// Stop polling and wait for the thread; idempotent
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                warn!(path = %self.path.display(), "Config watcher thread panicked");
            }
        }
    }
}

impl Drop for FileOptionsWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Poller {
    path: PathBuf,
    last_content: Option<String>,
    monitor: OptionsMonitor,
}

impl Poller {
    fn poll(&mut self) {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if self.last_content.take().is_some() {
                    warn!(path = %self.path.display(), error = %e, "Config file unreadable, keeping previous options");
                }
                return;
            }
        };
        if self.last_content.as_deref() == Some(content.as_str()) {
            return;
        }

        let loaded = ConfigLoader::format_of(&self.path)
            .and_then(|format| ConfigLoader::load_from_str(&content, format));
        self.last_content = Some(content);
        match loaded {
            Ok(options) => {
                if self.monitor.set_if_changed(options) {
                    info!(path = %self.path.display(), "Config file reloaded");
                }
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Config reload failed, keeping previous options");
            }
        }
    }
}

/// Sleep `interval` in small steps; false once stop is requested
fn sleep_unless_stopped(stop: &AtomicBool, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(STOP_CHECK_STEP));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{OptionsSource, RouterOptions};
    use std::fs;
    use tempfile::tempdir;

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn test_reload_on_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.toml");
        fs::write(&path, "ShouldEmitSinkAExpression = \"true\"\n").unwrap();

        let (monitor, watcher) =
            FileOptionsWatcher::watch(&path, Duration::from_millis(20)).unwrap();
        assert_eq!(monitor.current(), RouterOptions::new("true", ""));

        fs::write(
            &path,
            "ShouldEmitSinkAExpression = \"Level >= Warning\"\nShouldEmitSinkBExpression = \"true\"\n",
        )
        .unwrap();
        assert!(wait_for(|| monitor.current() == RouterOptions::new("Level >= Warning", "true")));

        watcher.stop();
        watcher.stop();
        assert!(!watcher.is_running());
    }

    #[test]
    fn test_invalid_file_keeps_previous() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.json");
        fs::write(&path, r#"{ "ShouldEmitSinkAExpression": "true" }"#).unwrap();

        let (monitor, _watcher) =
            FileOptionsWatcher::watch(&path, Duration::from_millis(20)).unwrap();

        fs::write(&path, "{ not json").unwrap();
        thread::sleep(Duration::from_millis(150));
        assert_eq!(monitor.current(), RouterOptions::new("true", ""));

        fs::write(&path, r#"{ "ShouldEmitSinkAExpression": "false" }"#).unwrap();
        assert!(wait_for(|| monitor.current() == RouterOptions::new("false", "")));
    }

    #[test]
    fn test_initial_load_must_succeed() {
        let dir = tempdir().unwrap();
        let result = FileOptionsWatcher::watch(dir.path().join("missing.toml"), DEFAULT_WATCH_INTERVAL);
        assert!(result.is_err());
    }
}

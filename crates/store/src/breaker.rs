use crate::error::StoreError;
use crate::file_lock::{FileLock, DEFAULT_LOCK_TIMEOUT};
use crate::validate_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TRIP_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ErrorRecord {
    count: u32,
    ts: DateTime<Utc>,
}

/// Cross-invocation failure counter with a project-wide kill switch.
///
/// Once the sentinel exists the gate resolves every request to ALLOW without
/// running checks. Nothing here removes the sentinel automatically; clearing
/// it is an operator action (`reset`).
pub struct CircuitBreaker {
    sentinel: PathBuf,
    session_dir: PathBuf,
    threshold: u32,
    lock_timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(sentinel: impl Into<PathBuf>, session_dir: impl Into<PathBuf>) -> Self {
        Self {
            sentinel: sentinel.into(),
            session_dir: session_dir.into(),
            threshold: DEFAULT_TRIP_THRESHOLD,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// A threshold of zero keeps the default.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        if threshold > 0 {
            self.threshold = threshold;
        }
        self
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn sentinel_path(&self) -> &Path {
        &self.sentinel
    }

    /// Infallible by construction: an unreadable sentinel counts as absent.
    pub fn is_tripped(&self) -> bool {
        self.sentinel.exists()
    }

    pub fn trip(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.sentinel.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.sentinel, "tripped\n")?;
        tracing::error!("Circuit breaker tripped: {}", self.sentinel.display());
        Ok(())
    }

    /// Count one internal error for the session. Returns true once the count
    /// reaches the threshold.
    pub fn record_error(&self, session_id: &str) -> Result<bool, StoreError> {
        let path = self.errors_path(session_id)?;
        let _lock = FileLock::acquire(&path.with_extension("lock"), self.lock_timeout)?;

        let count = self.read_count(&path, session_id)?.saturating_add(1);
        let record = ErrorRecord { count, ts: Utc::now() };
        fs::write(&path, serde_json::to_string(&record)?)?;

        tracing::warn!(
            "Recorded gate error {}/{} for session: {}",
            count,
            self.threshold,
            session_id
        );
        Ok(count >= self.threshold)
    }

    pub fn error_count(&self, session_id: &str) -> Result<u32, StoreError> {
        let path = self.errors_path(session_id)?;
        self.read_count(&path, session_id)
    }

    /// Remove the sentinel and, when given, one session's error counter.
    /// Returns whether the breaker was tripped.
    pub fn reset(&self, session_id: Option<&str>) -> Result<bool, StoreError> {
        let was_tripped = remove_if_present(&self.sentinel)?;
        if let Some(session_id) = session_id {
            remove_if_present(&self.errors_path(session_id)?)?;
        }
        if was_tripped {
            tracing::info!("Circuit breaker cleared: {}", self.sentinel.display());
        }
        Ok(was_tripped)
    }

    fn errors_path(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let key = validate_key(session_id)?;
        Ok(self.session_dir.join(format!("{}.errors.json", key)))
    }

    fn read_count(&self, path: &Path, session_id: &str) -> Result<u32, StoreError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<ErrorRecord>(&content) {
            Ok(record) => Ok(record.count),
            Err(e) => {
                tracing::warn!("Corrupted error counter for session {}: {}", session_id, e);
                Ok(0)
            }
        }
    }
}

fn remove_if_present(path: &Path) -> Result<bool, StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

use crate::error::StoreError;
use crate::file_lock::{FileLock, DEFAULT_LOCK_TIMEOUT};
use crate::validate_key;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Running spend for one session.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionLedger {
    #[serde(rename = "cost_usd", default)]
    pub accumulated_cost: f64,
    #[serde(rename = "events", default)]
    pub event_count: u64,
}

/// Outcome of a budgeted commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Charge {
    /// Ledger total after the operation.
    pub accumulated: f64,
    /// Total the charge would have produced.
    pub attempted: f64,
    pub committed: bool,
}

impl SessionLedger {
    /// Apply `amount` if the resulting total stays within `limit`.
    pub fn apply(&mut self, amount: f64, limit: f64) -> Charge {
        let attempted = self.accumulated_cost + amount;
        if attempted > limit {
            return Charge {
                accumulated: self.accumulated_cost,
                attempted,
                committed: false,
            };
        }
        self.accumulated_cost = attempted;
        self.event_count += 1;
        Charge {
            accumulated: attempted,
            attempted,
            committed: true,
        }
    }
}

/// Per-session budget persistence.
///
/// `commit_charge` is a single atomic read-compare-write with respect to other
/// calls for the same session id.
pub trait LedgerStore: Send + Sync {
    /// Overwrite the session's record with the zero ledger.
    fn reset(&self, session_id: &str) -> Result<(), StoreError>;

    /// Current record; the zero ledger when none exists.
    fn load(&self, session_id: &str) -> Result<SessionLedger, StoreError>;

    /// Add `amount` unless the new total would exceed `limit`, in which case
    /// the record is left untouched and `committed` is false.
    fn commit_charge(&self, session_id: &str, amount: f64, limit: f64) -> Result<Charge, StoreError>;
}

fn validate_amount(amount: f64) -> Result<(), StoreError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(StoreError::InvalidAmount(amount));
    }
    Ok(())
}

/// One JSON record per session under `dir`, guarded by a sidecar lock file.
///
/// Construction touches nothing on disk; `dir` is created by the first
/// locked operation.
pub struct FileLedgerStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl FileLedgerStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn ledger_path(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let key = validate_key(session_id)?;
        Ok(self.dir.join(format!("session-{}.json", key)))
    }

    fn lock_path(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let key = validate_key(session_id)?;
        Ok(self.dir.join(format!("session-{}.lock", key)))
    }

    fn lock(&self, session_id: &str) -> Result<FileLock, StoreError> {
        FileLock::acquire(&self.lock_path(session_id)?, self.lock_timeout)
    }

    fn read_record(path: &Path) -> Result<SessionLedger, StoreError> {
        match fs::read_to_string(path) {
            Ok(content) if content.trim().is_empty() => Ok(SessionLedger::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SessionLedger::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_record(path: &Path, ledger: &SessionLedger) -> Result<(), StoreError> {
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            let json = serde_json::to_string_pretty(ledger)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

impl LedgerStore for FileLedgerStore {
    fn reset(&self, session_id: &str) -> Result<(), StoreError> {
        let path = self.ledger_path(session_id)?;
        let _lock = self.lock(session_id)?;
        Self::write_record(&path, &SessionLedger::default())?;
        tracing::debug!("Reset ledger for session: {}", session_id);
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<SessionLedger, StoreError> {
        let path = self.ledger_path(session_id)?;
        match Self::read_record(&path) {
            Err(StoreError::Json(e)) => {
                tracing::warn!("Corrupted ledger for session {}: {}", session_id, e);
                Ok(SessionLedger::default())
            }
            other => other,
        }
    }

    fn commit_charge(&self, session_id: &str, amount: f64, limit: f64) -> Result<Charge, StoreError> {
        validate_amount(amount)?;
        let path = self.ledger_path(session_id)?;
        let _lock = self.lock(session_id)?;

        let mut ledger = Self::read_record(&path)?;
        let charge = ledger.apply(amount, limit);
        if charge.committed {
            Self::write_record(&path, &ledger)?;
        }
        Ok(charge)
    }
}

/// In-process ledger store.
#[derive(Default)]
pub struct MemoryLedgerStore {
    ledgers: Mutex<HashMap<String, SessionLedger>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn reset(&self, session_id: &str) -> Result<(), StoreError> {
        let key = validate_key(session_id)?;
        self.ledgers.lock().insert(key.to_string(), SessionLedger::default());
        Ok(())
    }

    fn load(&self, session_id: &str) -> Result<SessionLedger, StoreError> {
        let key = validate_key(session_id)?;
        Ok(self.ledgers.lock().get(key).copied().unwrap_or_default())
    }

    fn commit_charge(&self, session_id: &str, amount: f64, limit: f64) -> Result<Charge, StoreError> {
        validate_amount(amount)?;
        let key = validate_key(session_id)?;
        let mut ledgers = self.ledgers.lock();
        let ledger = ledgers.entry(key.to_string()).or_default();
        Ok(ledger.apply(amount, limit))
    }
}

use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One JSON object per line, appended and synced per record.
pub struct AuditLog {
    file: Mutex<File>,
}

impl AuditLog {
    pub fn new<P: AsRef<Path>>(log_path: P) -> Result<Self, AuditError> {
        let log_path = log_path.as_ref();

        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub fn append<T: Serialize>(&self, record: &T) -> Result<(), AuditError> {
        // Serialize first so a failing record never leaves a partial line.
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self.file.lock();
        file.write_all(line.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    /// Current length in bytes; used as a session's scan offset.
    pub fn size(&self) -> Result<u64, AuditError> {
        Ok(self.file.lock().metadata()?.len())
    }
}

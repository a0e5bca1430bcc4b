use crate::error::StoreError;
use crate::validate_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OffsetRecord {
    size: u64,
    ts: DateTime<Utc>,
}

/// Audit-log byte offset captured when a session starts, so roll-ups only
/// scan that session's share of the log.
pub struct LogOffsets {
    session_dir: PathBuf,
}

impl LogOffsets {
    pub fn new(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
        }
    }

    pub fn save(&self, session_id: &str, size: u64) -> Result<(), StoreError> {
        let path = self.offset_path(session_id)?;
        fs::create_dir_all(&self.session_dir)?;
        let record = OffsetRecord { size, ts: Utc::now() };
        fs::write(path, serde_json::to_string(&record)?)?;
        Ok(())
    }

    /// Zero when no offset was saved or the record is unreadable.
    pub fn load(&self, session_id: &str) -> u64 {
        let Ok(path) = self.offset_path(session_id) else {
            return 0;
        };
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<OffsetRecord>(&content).ok())
            .map(|record| record.size)
            .unwrap_or(0)
    }

    fn offset_path(&self, session_id: &str) -> Result<PathBuf, StoreError> {
        let key = validate_key(session_id)?;
        Ok(self.session_dir.join(format!("{}.offset.json", key)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let offsets = LogOffsets::new(temp.path().join("session"));
        assert_eq!(offsets.load("s1"), 0);

        offsets.save("s1", 4096).unwrap();
        assert_eq!(offsets.load("s1"), 4096);
        assert_eq!(offsets.load("s2"), 0);
    }

    #[test]
    fn test_invalid_key() {
        let temp = TempDir::new().unwrap();
        let offsets = LogOffsets::new(temp.path());
        assert!(offsets.save("../x", 1).is_err());
        assert_eq!(offsets.load("../x"), 0);
    }
}

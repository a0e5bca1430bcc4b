use std::path::{Path, PathBuf};

const ROOT_MARKERS: &[&str] = &[".claude", "mcp"];
const MAX_ASCENT: usize = 8;

/// Walk up from `start` looking for a directory that carries a project
/// marker. Falls back to `fallback`, then to `start` itself.
pub fn find_project_root(start: &Path, fallback: Option<PathBuf>) -> PathBuf {
    for dir in start.ancestors().take(MAX_ASCENT) {
        if ROOT_MARKERS.iter().any(|marker| dir.join(marker).is_dir()) {
            return dir.to_path_buf();
        }
    }
    fallback
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| start.to_path_buf())
}

/// Where every piece of gate state lives relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn observability_dir(&self) -> PathBuf {
        self.root.join("runs").join("observability")
    }

    pub fn log_path(&self) -> PathBuf {
        self.observability_dir().join("hooks.jsonl")
    }

    pub fn ledger_dir(&self) -> PathBuf {
        self.observability_dir().join("ledgers")
    }

    pub fn session_dir(&self) -> PathBuf {
        self.root.join(".claude").join("session")
    }

    pub fn breaker_sentinel(&self) -> PathBuf {
        self.root.join(".claude").join("hooks.disabled")
    }

    pub fn consent_file(&self) -> PathBuf {
        self.root.join(".claude").join("secondary_consent.txt")
    }

    pub fn result_cards_dir(&self, run_id: &str) -> PathBuf {
        self.root.join("runs").join(run_id).join("result-cards")
    }
}

//! File-backed state shared across independent gate invocations.
//!
//! Every invocation is a fresh process, so the session ledger and circuit
//! breaker live on disk. Read-modify-write sequences run under an exclusive
//! advisory lock on a sidecar `.lock` file.

pub mod breaker;
pub mod error;
pub mod file_lock;
pub mod ledger;
pub mod offset;

pub use breaker::{CircuitBreaker, DEFAULT_TRIP_THRESHOLD};
pub use error::StoreError;
pub use file_lock::{FileLock, DEFAULT_LOCK_TIMEOUT};
pub use ledger::{Charge, FileLedgerStore, LedgerStore, MemoryLedgerStore, SessionLedger};
pub use offset::LogOffsets;

/// Session id used when the host supplies none.
pub const UNKNOWN_SESSION: &str = "unknown";

pub fn session_or_unknown(session_id: Option<&str>) -> &str {
    match session_id {
        Some(id) if !id.is_empty() => id,
        _ => UNKNOWN_SESSION,
    }
}

/// Session ids become file names; reject anything that could leave the
/// state directory.
pub fn validate_key(session_id: &str) -> Result<&str, StoreError> {
    if session_id.is_empty()
        || session_id.contains("..")
        || session_id.contains('/')
        || session_id.contains('\\')
        || session_id.contains('\0')
    {
        return Err(StoreError::InvalidKey(session_id.to_string()));
    }
    Ok(session_id)
}

use hookgate_audit::AuditError;
use hookgate_store::StoreError;
use thiserror::Error;

/// Anything that stops an evaluation from producing a decision.
///
/// None of these ever reach the host as a block; the gate boundary turns
/// them into an ALLOW and counts them against the circuit breaker.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Append-only observability log for gate hooks.

pub mod audit_log;
pub mod records;
pub mod redact;
pub mod summary;

pub use audit_log::{AuditError, AuditLog};
pub use records::{EventKind, HookContext, PostToolRecord, SessionStartRecord, SummaryRecord};
pub use redact::Redactor;
pub use summary::{summarize, ResultCard, SessionSummary, SummaryFilter, ToolTally};

//! Admission control for agent tool calls.
//!
//! [`AdmissionEngine`] turns one [`ToolRequest`] into a [`Decision`].
//! [`Gate`] wraps it for a single hook process: it reads the payload, writes
//! the audit line, and converts any internal failure into a fail-open
//! [`Verdict`] counted by the circuit breaker.

pub mod config;
pub mod cost;
pub mod decision;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod gate;
pub mod lifecycle;
pub mod project;
pub mod record;
pub mod request;

pub use config::{GateConfig, GateMode};
pub use cost::estimate_cost;
pub use decision::{CheckBreakdown, Decision, Denial, SkipReason};
pub use engine::AdmissionEngine;
pub use enrich::{enrichments, DEFAULT_TIMEOUT_MS};
pub use error::GateError;
pub use gate::{Gate, Verdict};
pub use project::{find_project_root, ProjectLayout};
pub use record::PreToolRecord;
pub use request::{HookInput, ToolRequest};

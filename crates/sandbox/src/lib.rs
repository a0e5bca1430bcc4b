//! Independent safety checkers for proposed tool invocations.
//!
//! Each guard inspects the parameters of one request and reports every
//! violation it finds. Guards never fail the caller; combining their
//! findings into a decision is the admission engine's job.

pub mod command_guard;
pub mod host_guard;
pub mod path_guard;
pub mod resource_guard;
pub mod violation;

pub use command_guard::CommandGuard;
pub use host_guard::HostGuard;
pub use path_guard::PathGuard;
pub use resource_guard::ResourceGuard;
pub use violation::{CheckSource, Violation};

use serde_json::{Map, Value};

pub type Params = Map<String, Value>;

/// Which family of guards a tool falls under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Write,
    Shell,
    Database,
    Http,
    Other,
}

impl ToolKind {
    pub fn classify(tool_id: &str) -> Self {
        match tool_id.to_lowercase().as_str() {
            "write" | "edit" | "write_file" | "edit_file" | "multiedit" | "notebookedit" => ToolKind::Write,
            "bash" | "run" | "shell" | "powershell" => ToolKind::Shell,
            "postgres" | "db.query" | "database" => ToolKind::Database,
            "http" | "fetch" => ToolKind::Http,
            _ => ToolKind::Other,
        }
    }
}

/// First string value found under any of `keys`.
pub(crate) fn first_str<'a>(params: &'a Params, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| params.get(*k))
        .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
}

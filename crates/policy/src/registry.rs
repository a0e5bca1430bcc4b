use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// How much risk a tool's side effects carry.
///
/// Only `Secondary` triggers consent and budgeting. Tools missing from the
/// registry resolve to `Unknown`, which is treated like `Primary`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Primary,
    Secondary,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TrustTier {
    pub fn as_str(self) -> &'static str {
        match self {
            TrustTier::Primary => "primary",
            TrustTier::Secondary => "secondary",
            TrustTier::Unknown => "unknown",
        }
    }

    pub fn is_secondary(self) -> bool {
        self == TrustTier::Secondary
    }
}

impl std::fmt::Display for TrustTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolEntry {
    #[serde(default)]
    pub tier: TrustTier,
    #[serde(default)]
    pub side_effects: Vec<String>,
    /// Fixed per-call estimate; overrides the size-based cost model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

/// Tool id to tier and declared side effects.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Registry {
    #[serde(default)]
    pub tools: HashMap<String, ToolEntry>,
}

impl Registry {
    pub fn entry(&self, tool_id: &str) -> Option<&ToolEntry> {
        self.tools.get(tool_id)
    }

    pub fn tier(&self, tool_id: &str) -> TrustTier {
        self.entry(tool_id).map(|e| e.tier).unwrap_or_default()
    }

    pub fn side_effects(&self, tool_id: &str) -> BTreeSet<String> {
        self.entry(tool_id)
            .map(|e| e.side_effects.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn insert(&mut self, tool_id: impl Into<String>, entry: ToolEntry) {
        self.tools.insert(tool_id.into(), entry);
    }
}

use crate::policies::{CostModel, PolicyTable};
use crate::registry::{Registry, ToolEntry, TrustTier};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

pub const REGISTRY_FILE: &str = "mcp/registry.yaml";
pub const POLICIES_FILE: &str = "mcp/policies.yaml";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Read-only policy input to the admission engine.
///
/// `None` on either side means the document is absent or unreadable: no tool
/// is secondary and built-in defaults apply.
#[derive(Debug, Clone, Default)]
pub struct PolicyData {
    pub registry: Option<Registry>,
    pub policies: Option<PolicyTable>,
}

impl PolicyData {
    pub fn new(registry: Option<Registry>, policies: Option<PolicyTable>) -> Self {
        Self { registry, policies }
    }

    /// Load both documents from a project root. Never fails: a document that
    /// cannot be read or parsed is logged and treated as absent.
    pub fn load(project_root: &Path) -> Self {
        let registry = load_optional::<Registry>(&project_root.join(REGISTRY_FILE));
        let policies = load_optional::<PolicyTable>(&project_root.join(POLICIES_FILE));
        Self { registry, policies }
    }

    pub fn entry(&self, tool_id: &str) -> Option<&ToolEntry> {
        self.registry.as_ref().and_then(|r| r.entry(tool_id))
    }

    pub fn tier(&self, tool_id: &str) -> TrustTier {
        self.registry
            .as_ref()
            .map(|r| r.tier(tool_id))
            .unwrap_or_default()
    }

    pub fn side_effects(&self, tool_id: &str) -> BTreeSet<String> {
        self.registry
            .as_ref()
            .map(|r| r.side_effects(tool_id))
            .unwrap_or_default()
    }

    pub fn budget_for(&self, tier: TrustTier, tool_id: &str) -> f64 {
        match &self.policies {
            Some(table) => table.budget_for(tier, tool_id),
            None => PolicyTable::default().budget_for(tier, tool_id),
        }
    }

    pub fn cost_model(&self) -> CostModel {
        self.policies
            .as_ref()
            .map(|p| p.cost.clone())
            .unwrap_or_default()
    }
}

/// Parse a YAML document. An empty file yields the type's default.
pub fn read_yaml<T: DeserializeOwned + Default>(path: &Path) -> Result<T, PolicyError> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

fn load_optional<T: DeserializeOwned + Default>(path: &Path) -> Option<T> {
    if !path.exists() {
        tracing::debug!("Policy document not present: {}", path.display());
        return None;
    }
    match read_yaml(path) {
        Ok(doc) => Some(doc),
        Err(e) => {
            tracing::warn!("Ignoring unreadable policy document {}: {}", path.display(), e);
            None
        }
    }
}

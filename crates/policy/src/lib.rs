//! Trust-tier registry and budget policy data.
//!
//! Both documents are optional. A project without `mcp/registry.yaml` has no
//! secondary tools, and one without `mcp/policies.yaml` falls back to the
//! built-in budget and cost defaults.

pub mod data;
pub mod policies;
pub mod registry;

pub use data::{PolicyData, PolicyError, POLICIES_FILE, REGISTRY_FILE};
pub use policies::{CostModel, PolicyTable, TierPolicy, DEFAULT_SECONDARY_BUDGET_USD};
pub use registry::{Registry, ToolEntry, TrustTier};

use crate::project::ProjectLayout;
use hookgate_audit::HookContext;
use hookgate_store::DEFAULT_TRIP_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_AGENT: &str = "unknown";
const DEFAULT_MAX_LOG_MB: u64 = 10;

/// How violations are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateMode {
    #[default]
    Off,
    Warn,
    Block,
}

impl GateMode {
    /// Unrecognised values fall back to `Off`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "warn" => GateMode::Warn,
            "block" => GateMode::Block,
            _ => GateMode::Off,
        }
    }

    pub fn enforces(self) -> bool {
        self == GateMode::Block
    }
}

/// Per-process settings, read once from the environment.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub mode: GateMode,
    pub disabled: bool,
    /// Orchestration run identifier (`AUV_ID`).
    pub run_id: Option<String>,
    pub require_orchestration: bool,
    pub trip_threshold: u32,
    pub consent_flag: bool,
    pub consent_file: PathBuf,
    pub staging_url: Option<String>,
    pub api_base: Option<String>,
    pub db_url: Option<String>,
    pub agent: String,
    pub max_log_bytes: u64,
}

impl GateConfig {
    pub fn from_env(layout: &ProjectLayout) -> Self {
        Self::from_lookup(layout, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(layout: &ProjectLayout, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let trip_threshold = get("HOOKS_ERROR_TRIP")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_TRIP_THRESHOLD);

        let max_log_bytes = get("HOOKS_MAX_LOG_MB")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_LOG_MB)
            .saturating_mul(1024 * 1024);

        Self {
            mode: get("HOOKS_MODE").map(|v| GateMode::parse(&v)).unwrap_or_default(),
            disabled: get("CLAUDE_DISABLE_HOOKS").is_some_and(|v| is_truthy(&v)),
            run_id: get("AUV_ID"),
            require_orchestration: get("HOOKS_REQUIRE_ORCHESTRATION").map_or(true, |v| !is_falsy(&v)),
            trip_threshold,
            consent_flag: get("SECONDARY_CONSENT").is_some_and(|v| is_truthy(&v)),
            consent_file: layout.consent_file(),
            staging_url: get("STAGING_URL"),
            api_base: get("API_BASE"),
            db_url: get("DB_URL"),
            agent: get("CLAUDE_AGENT_NAME").unwrap_or_else(|| DEFAULT_AGENT.to_string()),
            max_log_bytes,
        }
    }

    pub fn is_orchestrated(&self) -> bool {
        self.run_id.is_some()
    }

    /// Whether this invocation falls inside the context the gate governs.
    pub fn governs(&self) -> bool {
        !self.require_orchestration || self.is_orchestrated()
    }

    pub fn consent_present(&self) -> bool {
        self.consent_flag || self.consent_file.exists()
    }

    pub fn base_urls(&self) -> impl Iterator<Item = &str> {
        self.staging_url.iter().chain(self.api_base.iter()).map(String::as_str)
    }

    pub fn context(&self, session_id: Option<&str>) -> HookContext {
        HookContext {
            session_id: session_id.map(str::to_string),
            agent: self.agent.clone(),
            auv: self.run_id.clone(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn is_falsy(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "0" | "false" | "no")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> GateConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        GateConfig::from_lookup(&ProjectLayout::new("/nonexistent"), |k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.mode, GateMode::Off);
        assert!(!config.disabled);
        assert!(config.require_orchestration);
        assert!(!config.governs());
        assert_eq!(config.trip_threshold, DEFAULT_TRIP_THRESHOLD);
        assert_eq!(config.agent, "unknown");
        assert_eq!(config.max_log_bytes, 10 * 1024 * 1024);
        assert!(!config.consent_present());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(config(&[("HOOKS_MODE", "BLOCK")]).mode, GateMode::Block);
        assert_eq!(config(&[("HOOKS_MODE", "warn")]).mode, GateMode::Warn);
        assert_eq!(config(&[("HOOKS_MODE", "strict")]).mode, GateMode::Off);
    }

    #[test]
    fn test_orchestration_flag() {
        assert!(config(&[("AUV_ID", "AUV-1")]).governs());
        assert!(config(&[("HOOKS_REQUIRE_ORCHESTRATION", "false")]).governs());
        assert!(!config(&[("HOOKS_REQUIRE_ORCHESTRATION", "yes")]).governs());
    }

    #[test]
    fn test_numeric_overrides() {
        let config = config(&[("HOOKS_ERROR_TRIP", "5"), ("HOOKS_MAX_LOG_MB", "1")]);
        assert_eq!(config.trip_threshold, 5);
        assert_eq!(config.max_log_bytes, 1024 * 1024);

        let invalid = self::config(&[("HOOKS_ERROR_TRIP", "0"), ("HOOKS_MAX_LOG_MB", "lots")]);
        assert_eq!(invalid.trip_threshold, DEFAULT_TRIP_THRESHOLD);
        assert_eq!(invalid.max_log_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_flags_and_base_urls() {
        let config = config(&[
            ("CLAUDE_DISABLE_HOOKS", "Yes"),
            ("SECONDARY_CONSENT", "1"),
            ("STAGING_URL", "https://staging.example.com"),
            ("API_BASE", "https://api.example.com"),
        ]);
        assert!(config.disabled);
        assert!(config.consent_present());
        assert_eq!(config.base_urls().count(), 2);
    }
}

use crate::config::GateMode;
use hookgate_policy::TrustTier;
use hookgate_sandbox::{CheckSource, Violation};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// A reason the gate would refuse a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Denial {
    PolicyViolation(Violation),
    ConsentRequired { tool: String, consent_file: PathBuf },
    BudgetExceeded { attempted: f64, limit: f64 },
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Denial::PolicyViolation(violation) => write!(f, "{}", violation.message),
            Denial::ConsentRequired { tool, consent_file } => write!(
                f,
                "Tool '{}' is secondary and requires consent. Set SECONDARY_CONSENT=true or create {}.",
                tool,
                consent_file.display()
            ),
            Denial::BudgetExceeded { attempted, limit } => write!(
                f,
                "Estimated secondary spend {:.2} > budget {:.2}",
                attempted, limit
            ),
        }
    }
}

/// Why the gate resolved to ALLOW without running checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    BreakerTripped,
    NotOrchestrated,
    ModeOff,
}

/// Which denial sources fired, for the audit record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckBreakdown {
    pub consent: bool,
    pub write_sandbox: bool,
    pub shell: bool,
    pub network: bool,
    pub resource: bool,
    pub budget: bool,
}

impl CheckBreakdown {
    fn mark(&mut self, denial: &Denial) {
        match denial {
            Denial::ConsentRequired { .. } => self.consent = true,
            Denial::BudgetExceeded { .. } => self.budget = true,
            Denial::PolicyViolation(violation) => match violation.source {
                CheckSource::WriteSandbox => self.write_sandbox = true,
                CheckSource::Shell => self.shell = true,
                CheckSource::Network => self.network = true,
                CheckSource::Resource => self.resource = true,
            },
        }
    }
}

/// The gate's answer for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub allow: bool,
    pub reason: Option<String>,
    pub enrichments: Option<Map<String, Value>>,
    pub estimated_cost: f64,
    pub tier: TrustTier,
    pub side_effects: BTreeSet<String>,
    pub mode: GateMode,
    /// Every denial found, including ones `warn` mode let through.
    pub violations: Vec<Denial>,
    pub checks: CheckBreakdown,
    pub skipped: Option<SkipReason>,
    /// Whether the estimated cost was committed to the session ledger.
    pub charged: bool,
}

impl Decision {
    pub(crate) fn pending(tier: TrustTier, side_effects: BTreeSet<String>, mode: GateMode) -> Self {
        Self {
            allow: true,
            reason: None,
            enrichments: None,
            estimated_cost: 0.0,
            tier,
            side_effects,
            mode,
            violations: Vec::new(),
            checks: CheckBreakdown::default(),
            skipped: None,
            charged: false,
        }
    }

    pub(crate) fn skip(mut self, reason: SkipReason) -> Self {
        self.skipped = Some(reason);
        self
    }

    pub(crate) fn record(&mut self, denial: Denial) {
        self.checks.mark(&denial);
        self.violations.push(denial);
    }

    /// Fold recorded denials into `allow` and `reason`.
    pub(crate) fn finish(mut self) -> Self {
        if !self.violations.is_empty() {
            let reasons: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
            self.reason = Some(reasons.join("; "));
            self.allow = !self.mode.enforces();
        }
        self
    }

    pub fn is_deny(&self) -> bool {
        !self.allow
    }

    /// Allowed despite recorded denials.
    pub fn warned(&self) -> bool {
        self.allow && !self.violations.is_empty()
    }
}

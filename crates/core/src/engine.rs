use crate::config::{GateConfig, GateMode};
use crate::cost::estimate_cost;
use crate::decision::{Decision, Denial, SkipReason};
use crate::enrich::enrichments;
use crate::error::GateError;
use crate::request::ToolRequest;
use hookgate_policy::PolicyData;
use hookgate_sandbox::{CommandGuard, HostGuard, PathGuard, ResourceGuard, ToolKind, Violation};
use hookgate_store::{CircuitBreaker, LedgerStore};
use std::path::Path;

/// Composes the consent rule, the safety checkers and the session budget
/// into one decision per request.
///
/// The only side effect is the ledger commit for an admitted chargeable
/// call; it happens before the decision is returned.
pub struct AdmissionEngine<'a> {
    config: &'a GateConfig,
    policy: &'a PolicyData,
    ledger: &'a dyn LedgerStore,
    breaker: &'a CircuitBreaker,
    project_root: &'a Path,
}

impl<'a> AdmissionEngine<'a> {
    pub fn new(
        config: &'a GateConfig,
        policy: &'a PolicyData,
        ledger: &'a dyn LedgerStore,
        breaker: &'a CircuitBreaker,
        project_root: &'a Path,
    ) -> Self {
        Self {
            config,
            policy,
            ledger,
            breaker,
            project_root,
        }
    }

    pub fn evaluate(&self, request: &ToolRequest) -> Result<Decision, GateError> {
        let tool = request.tool_id.as_str();
        let tier = self.policy.tier(tool);
        let mut decision = Decision::pending(tier, self.policy.side_effects(tool), self.config.mode);

        if let Some(reason) = self.precondition() {
            tracing::debug!("Skipping checks for {}: {:?}", tool, reason);
            return Ok(decision.skip(reason));
        }
        let enforce = self.config.mode.enforces();

        decision.estimated_cost = estimate_cost(self.policy, tool, &request.params)?;

        if tier.is_secondary() && !self.config.consent_present() {
            decision.record(Denial::ConsentRequired {
                tool: tool.to_string(),
                consent_file: self.config.consent_file.clone(),
            });
            if enforce {
                return Ok(decision.finish());
            }
        }

        let violations = self.inspect(request)?;
        if !violations.is_empty() {
            for violation in violations {
                decision.record(Denial::PolicyViolation(violation));
            }
            if enforce {
                return Ok(decision.finish());
            }
        }

        if tier.is_secondary() && decision.estimated_cost > 0.0 {
            let limit = self.policy.budget_for(tier, tool);
            let charge = self
                .ledger
                .commit_charge(request.session_key(), decision.estimated_cost, limit)?;
            if charge.committed {
                decision.charged = true;
                tracing::debug!(
                    "Charged {:.6} to session {} (total {:.6})",
                    decision.estimated_cost,
                    request.session_key(),
                    charge.accumulated
                );
            } else {
                decision.record(Denial::BudgetExceeded {
                    attempted: charge.attempted,
                    limit,
                });
                if enforce {
                    return Ok(decision.finish());
                }
            }
        }

        decision.enrichments = enrichments(request, self.config);
        Ok(decision.finish())
    }

    /// Cheap checks that decide whether the gate runs at all. The breaker
    /// comes first and nothing here can fail.
    fn precondition(&self) -> Option<SkipReason> {
        if self.breaker.is_tripped() {
            Some(SkipReason::BreakerTripped)
        } else if self.config.disabled {
            Some(SkipReason::Disabled)
        } else if !self.config.governs() {
            Some(SkipReason::NotOrchestrated)
        } else if self.config.mode == GateMode::Off {
            Some(SkipReason::ModeOff)
        } else {
            None
        }
    }

    /// Run every applicable checker and union the findings.
    fn inspect(&self, request: &ToolRequest) -> Result<Vec<Violation>, GateError> {
        let params = &request.params;
        let hosts = HostGuard::new(self.config.base_urls());
        let mut violations = hosts.inspect(params);

        match ToolKind::classify(&request.tool_id) {
            ToolKind::Write => {
                let paths = PathGuard::new(self.project_root)?;
                violations.extend(paths.inspect(params));
            }
            ToolKind::Shell => violations.extend(CommandGuard::new().inspect(params)),
            ToolKind::Database => {
                violations.extend(ResourceGuard::new(self.config.db_url.clone()).inspect(params))
            }
            ToolKind::Http | ToolKind::Other => {}
        }

        if !violations.is_empty() {
            tracing::info!(
                "{} violation(s) for tool {}: {:?}",
                violations.len(),
                request.tool_id,
                violations.iter().map(|v| v.source).collect::<Vec<_>>()
            );
        }
        Ok(violations)
    }
}

use crate::cli::BreakerAction;
use anyhow::{Context, Result};
use hookgate_core::Gate;

pub fn run(gate: &Gate, action: &BreakerAction) -> Result<u8> {
    let breaker = gate.breaker();

    match action {
        BreakerAction::Status { session } => {
            let state = if breaker.is_tripped() { "tripped" } else { "armed" };
            println!("breaker: {} ({})", state, breaker.sentinel_path().display());
            println!("threshold: {}", breaker.threshold());
            if let Some(session) = session {
                let count = breaker
                    .error_count(session)
                    .with_context(|| format!("Failed to read error count for session {}", session))?;
                println!("errors[{}]: {}", session, count);
            }
        }
        BreakerAction::Reset { session } => {
            let was_tripped = breaker
                .reset(session.as_deref())
                .context("Failed to reset circuit breaker")?;
            if was_tripped {
                println!("✓ Circuit breaker cleared");
            } else {
                println!("Circuit breaker was not tripped");
            }
            if let Some(session) = session {
                println!("✓ Error counter cleared for session {}", session);
            }
        }
    }

    Ok(0)
}

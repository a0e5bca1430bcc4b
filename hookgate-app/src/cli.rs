use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hookgate")]
#[command(about = "Admission-control hooks for agent tool calls")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging on stderr (overrides HOOKGATE_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root; skips the upward search for `.claude` / `mcp`
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Root used when the upward search finds no marker
    #[arg(long, global = true, env = "CLAUDE_PROJECT_DIR", hide_env_values = true)]
    pub fallback_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Decide whether a proposed tool call may run (PreToolUse)
    PreTool,
    /// Record a finished tool call (PostToolUse)
    PostTool,
    /// Reset the session ledger (SessionStart)
    SessionStart,
    /// Write the session result card (SessionEnd)
    SessionEnd,
    /// Write the sub-agent result card (SubagentStop)
    SubagentStop,
    /// Inspect or clear the circuit breaker
    Breaker {
        #[command(subcommand)]
        action: BreakerAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum BreakerAction {
    /// Show whether the gate is tripped
    Status {
        #[arg(long)]
        session: Option<String>,
    },
    /// Remove the sentinel, and the session's error counter when given
    Reset {
        #[arg(long)]
        session: Option<String>,
    },
}

pub mod breaker;
pub mod hook;

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use hookgate_core::{find_project_root, Gate, GateConfig, ProjectLayout};
use std::path::PathBuf;

/// Run the selected command and return the process exit code.
pub fn run(cli: &Cli) -> Result<u8> {
    let gate = open_gate(cli.project_dir.clone(), cli.fallback_dir.clone())?;
    tracing::debug!("Project root: {}", gate.layout().root().display());

    match &cli.command {
        Commands::PreTool => Ok(hook::run(&gate, hook::HookKind::PreTool)),
        Commands::PostTool => Ok(hook::run(&gate, hook::HookKind::PostTool)),
        Commands::SessionStart => Ok(hook::run(&gate, hook::HookKind::SessionStart)),
        Commands::SessionEnd => Ok(hook::run(&gate, hook::HookKind::SessionEnd)),
        Commands::SubagentStop => Ok(hook::run(&gate, hook::HookKind::SubagentStop)),
        Commands::Breaker { action } => breaker::run(&gate, action),
    }
}

fn open_gate(project_dir: Option<PathBuf>, fallback: Option<PathBuf>) -> Result<Gate> {
    let root = match project_dir {
        Some(dir) => dir,
        None => {
            let cwd = std::env::current_dir().context("Failed to read working directory")?;
            find_project_root(&cwd, fallback)
        }
    };
    let layout = ProjectLayout::new(root);
    let config = GateConfig::from_env(&layout);
    Ok(Gate::new(layout, config))
}

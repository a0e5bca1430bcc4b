use crate::violation::{CheckSource, Violation};
use crate::{first_str, Params};
use regex::{Regex, RegexBuilder};

const COMMAND_KEYS: &[&str] = &["command", "cmd"];

/// (label, pattern). Matched case-insensitively anywhere in the command.
const DANGEROUS_PATTERNS: &[(&str, &str)] = &[
    ("recursive root delete", r"rm\s+-rf\s+/"),
    ("privilege escalation", r"sudo\s+"),
    ("pipe-to-interpreter download", r"curl\s+[^\n]+?\|\s*(sh|bash)"),
    ("pipe-to-interpreter download", r"wget\s+[^\n]+?\|\s*(sh|bash)"),
    ("pipe-to-interpreter download", r"Invoke-WebRequest[^\n]+?\|\s*iex"),
    ("remote copy", r"scp\s+"),
    ("remote login", r"ssh\s+"),
    ("registry publish", r"docker\s+(login|push)\b"),
    ("production deployment", r"kubectl\s+apply\b.*\s(-f|--filename)\s+.*prod"),
];

/// Matches shell commands against a fixed list of dangerous patterns.
pub struct CommandGuard {
    patterns: Vec<(&'static str, Regex)>,
}

impl CommandGuard {
    pub fn new() -> Self {
        let patterns = DANGEROUS_PATTERNS
            .iter()
            .filter_map(|(label, pattern)| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => Some((*label, re)),
                    Err(e) => {
                        tracing::error!("Invalid dangerous-command pattern {}: {}", pattern, e);
                        None
                    }
                }
            })
            .collect();
        Self { patterns }
    }

    /// Label of the first pattern `command` matches.
    pub fn matched(&self, command: &str) -> Option<&'static str> {
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(command))
            .map(|(label, _)| *label)
    }

    pub fn check(&self, command: &str) -> Result<(), Violation> {
        match self.matched(command) {
            Some(label) => Err(Violation::new(
                CheckSource::Shell,
                format!(
                    "Dangerous shell pattern detected ({}); command blocked by policy.",
                    label
                ),
            )),
            None => Ok(()),
        }
    }

    pub fn inspect(&self, params: &Params) -> Vec<Violation> {
        match first_str(params, COMMAND_KEYS) {
            Some(command) => self.check(command).err().into_iter().collect(),
            None => Vec::new(),
        }
    }
}

impl Default for CommandGuard {
    fn default() -> Self {
        Self::new()
    }
}

use regex::Regex;
use std::borrow::Cow;

const SECRET_PATTERN: &str =
    r#"(?i)(api[_-]?key|token|password|secret)["']?\s*[:=]\s*["']?([A-Za-z0-9._-]{10,})"#;

/// Masks credential-looking `key: value` pairs in logged text.
pub struct Redactor {
    pattern: Option<Regex>,
}

impl Redactor {
    pub fn new() -> Self {
        let pattern = match Regex::new(SECRET_PATTERN) {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::error!("Invalid secret pattern: {}", e);
                None
            }
        };
        Self { pattern }
    }

    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.pattern {
            Some(re) => re.replace_all(text, "${1}:REDACTED"),
            None => Cow::Borrowed(text),
        }
    }

    /// First `max_chars` characters of `text`, redacted.
    pub fn snippet(&self, text: &str, max_chars: usize) -> String {
        let truncated = match text.char_indices().nth(max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        };
        self.redact(truncated).into_owned()
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

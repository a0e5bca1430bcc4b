use crate::violation::{CheckSource, Violation};
use crate::Params;
use std::collections::BTreeSet;
use url::Url;

const URL_KEYS: &[&str] = &["url", "href", "endpoint"];
const LOOPBACK_HOSTS: &[&str] = &["localhost", "127.0.0.1", "::1"];
const PRODUCTION_MARKERS: &[&str] = &[".prod.", "production", "live", "payments"];

/// Outbound host allow/deny check for URL-bearing parameters.
///
/// Loopback and allow-listed hosts always pass. Any other host that carries a
/// production marker is a violation; everything else passes.
#[derive(Debug, Clone, Default)]
pub struct HostGuard {
    allowed_hosts: BTreeSet<String>,
}

impl HostGuard {
    /// Allow-list the hosts of the given base URLs (e.g. staging and API bases).
    pub fn new<'a>(base_urls: impl IntoIterator<Item = &'a str>) -> Self {
        let allowed_hosts = base_urls.into_iter().filter_map(host_of).collect();
        Self { allowed_hosts }
    }

    pub fn allowed_hosts(&self) -> &BTreeSet<String> {
        &self.allowed_hosts
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        let Some(host) = host_of(url) else {
            return true;
        };
        if LOOPBACK_HOSTS.contains(&host.as_str()) || self.allowed_hosts.contains(&host) {
            return true;
        }
        !PRODUCTION_MARKERS.iter().any(|marker| host.contains(marker))
    }

    pub fn check(&self, url: &str) -> Result<(), Violation> {
        if self.is_allowed(url) {
            return Ok(());
        }
        Err(Violation::new(
            CheckSource::Network,
            format!("HTTP target not allowed in this environment: {}", url),
        ))
    }

    pub fn inspect(&self, params: &Params) -> Vec<Violation> {
        URL_KEYS
            .iter()
            .filter_map(|key| params.get(*key).and_then(|v| v.as_str()))
            .filter(|url| url.starts_with("http"))
            .filter_map(|url| self.check(url).err())
            .collect()
    }
}

/// Lowercased host of `url`, without IPv6 brackets.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return None;
    }
    Some(host.to_lowercase())
}

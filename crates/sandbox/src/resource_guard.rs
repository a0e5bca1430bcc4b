use crate::violation::{CheckSource, Violation};
use crate::{first_str, Params};

const DSN_KEYS: &[&str] = &["dsn"];
const PRODUCTION_MARKER: &str = "prod";

/// Refuses database connections whose target looks like production.
#[derive(Debug, Clone, Default)]
pub struct ResourceGuard {
    fallback_dsn: Option<String>,
}

impl ResourceGuard {
    /// `fallback_dsn` is consulted when the request names no connection target.
    pub fn new(fallback_dsn: Option<String>) -> Self {
        Self { fallback_dsn }
    }

    pub fn check(&self, dsn: &str) -> Result<(), Violation> {
        if dsn.to_lowercase().contains(PRODUCTION_MARKER) {
            return Err(Violation::new(
                CheckSource::Resource,
                "Refusing DB connection that appears to target production.",
            ));
        }
        Ok(())
    }

    pub fn inspect(&self, params: &Params) -> Vec<Violation> {
        let dsn = first_str(params, DSN_KEYS).or(self.fallback_dsn.as_deref());
        match dsn {
            Some(dsn) => self.check(dsn).err().into_iter().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_production_dsn_refused() {
        let guard = ResourceGuard::default();
        assert!(guard.check("postgres://app@db.PROD.internal/app").is_err());
        assert!(guard.check("postgres://localhost/app_dev").is_ok());
    }

    #[test]
    fn test_fallback_dsn_used_when_param_missing() {
        let guard = ResourceGuard::new(Some("postgres://prod-primary/app".to_string()));
        let params = json!({"query": "select 1"});
        assert_eq!(guard.inspect(params.as_object().unwrap()).len(), 1);

        let params = json!({"dsn": "postgres://localhost/app"});
        assert!(guard.inspect(params.as_object().unwrap()).is_empty());
    }

    #[test]
    fn test_no_target_no_violation() {
        let guard = ResourceGuard::default();
        let params = json!({});
        assert!(guard.inspect(params.as_object().unwrap()).is_empty());
    }
}

use axum::http::HeaderMap;
use tracegate_models::{Trace, TraceQueryParameters};

use crate::authorize::{authorize, retain_authorized};
use crate::config::{AdminCode, TenancyConfig};
use crate::context::TenancyDecision;
use crate::scope::apply_scope;

/// Turns request headers into a [`TenancyDecision`] and applies it with the
/// configured tag key.
///
/// Tenant and admin codes are compared as raw header values: no trimming,
/// no case folding.
#[derive(Debug, Clone, Default)]
pub struct TenancyResolver {
    config: TenancyConfig,
}

impl TenancyResolver {
    pub fn new(config: TenancyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TenancyConfig {
        &self.config
    }

    pub fn resolve(&self, headers: &HeaderMap) -> TenancyDecision {
        if !self.config.is_enabled() {
            return TenancyDecision::disabled();
        }

        let tenant_code = header_value(headers, &self.config.tenant_header);
        if tenant_code.is_empty() {
            return TenancyDecision::disabled();
        }

        let admin_code = match &self.config.admin_code {
            AdminCode::Literal(code) => code.as_str(),
            AdminCode::Header(name) => header_value(headers, name),
        };
        // An unset admin code must never match.
        if !admin_code.is_empty() && tenant_code == admin_code {
            return TenancyDecision::admin(tenant_code);
        }

        tracing::info!(tenant = %tenant_code, "Tenant-scoped trace query");
        TenancyDecision::enforced(tenant_code)
    }

    pub fn scope_query(&self, decision: &TenancyDecision, params: &mut TraceQueryParameters) {
        apply_scope(params, decision, &self.config.tenant_tag);
    }

    pub fn authorize(&self, decision: &TenancyDecision, trace: &Trace) -> bool {
        authorize(trace, decision, &self.config.tenant_tag)
    }

    pub fn retain_authorized(&self, decision: &TenancyDecision, traces: Vec<Trace>) -> Vec<Trace> {
        retain_authorized(traces, decision, &self.config.tenant_tag)
    }
}

/// Raw value of `name`, or "" when the header is missing, unnamed or not
/// visible ASCII.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    if name.is_empty() {
        return "";
    }
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tracing_test::traced_test;

    fn resolver(admin: AdminCode) -> TenancyResolver {
        TenancyResolver::new(TenancyConfig::new("X-Tenant", admin, "tenant"))
    }

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(*value));
        }
        headers
    }

    #[test]
    fn test_disabled_without_config() {
        let resolver = TenancyResolver::default();
        let decision = resolver.resolve(&headers(&[("x-tenant", "acme")]));
        assert_eq!(decision, TenancyDecision::disabled());
    }

    #[test]
    fn test_disabled_without_tag_key() {
        let resolver = TenancyResolver::new(TenancyConfig::new(
            "X-Tenant",
            AdminCode::Literal("root".to_string()),
            "",
        ));
        assert!(!resolver.resolve(&headers(&[("x-tenant", "acme")])).enforced);
    }

    #[test]
    fn test_missing_header_is_not_enforced() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        assert_eq!(resolver.resolve(&HeaderMap::new()), TenancyDecision::disabled());
        assert_eq!(
            resolver.resolve(&headers(&[("x-tenant", "")])),
            TenancyDecision::disabled()
        );
    }

    #[test]
    fn test_tenant_header_enforces() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        let decision = resolver.resolve(&headers(&[("x-tenant", "acme")]));
        assert_eq!(decision, TenancyDecision::enforced("acme"));
    }

    #[test]
    fn test_literal_admin_bypasses() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        let decision = resolver.resolve(&headers(&[("x-tenant", "root")]));
        assert!(!decision.enforced);
        assert!(decision.is_admin);
    }

    #[test]
    fn test_admin_comparison_is_case_sensitive() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        let decision = resolver.resolve(&headers(&[("x-tenant", "ROOT")]));
        assert_eq!(decision, TenancyDecision::enforced("ROOT"));
    }

    #[test]
    fn test_tenant_code_is_not_trimmed_or_folded() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        let decision = resolver.resolve(&headers(&[("x-tenant", "Acme")]));
        assert_eq!(decision.tenant_code, "Acme");
    }

    #[test]
    fn test_admin_code_from_header() {
        let resolver = resolver(AdminCode::Header("X-Admin-Tenant".to_string()));

        let admin = resolver.resolve(&headers(&[("x-tenant", "ops"), ("x-admin-tenant", "ops")]));
        assert!(admin.is_admin);
        assert!(!admin.enforced);

        let tenant = resolver.resolve(&headers(&[("x-tenant", "acme"), ("x-admin-tenant", "ops")]));
        assert_eq!(tenant, TenancyDecision::enforced("acme"));
    }

    #[test]
    fn test_missing_admin_header_never_bypasses() {
        let from_header = resolver(AdminCode::Header("X-Admin-Tenant".to_string()));
        let decision = from_header.resolve(&headers(&[("x-tenant", "acme")]));
        assert_eq!(decision, TenancyDecision::enforced("acme"));

        let no_admin = resolver(AdminCode::default());
        assert!(no_admin.resolve(&headers(&[("x-tenant", "acme")])).enforced);
    }

    #[traced_test]
    #[test]
    fn test_enforced_request_logs_tenant_once() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        resolver.resolve(&headers(&[("x-tenant", "acme")]));

        assert!(logs_contain("Tenant-scoped trace query"));
        assert!(logs_contain("acme"));
        assert!(!logs_contain("root"));
        logs_assert(|lines: &[&str]| {
            match lines.iter().filter(|line| line.contains("Tenant-scoped trace query")).count() {
                1 => Ok(()),
                n => Err(format!("expected one tenant record, got {}", n)),
            }
        });
    }

    #[traced_test]
    #[test]
    fn test_admin_and_disabled_requests_are_not_logged() {
        let resolver = resolver(AdminCode::Literal("root".to_string()));
        resolver.resolve(&headers(&[("x-tenant", "root")]));
        resolver.resolve(&HeaderMap::new());
        TenancyResolver::default().resolve(&headers(&[("x-tenant", "acme")]));

        assert!(!logs_contain("Tenant-scoped trace query"));
        assert!(!logs_contain("root"));
    }

    #[test]
    fn test_scope_and_authorize_use_configured_tag() {
        use chrono::{Duration, Utc};

        let resolver = TenancyResolver::new(TenancyConfig::new(
            "X-Tenant",
            AdminCode::default(),
            "org",
        ));
        let decision = resolver.resolve(&headers(&[("x-tenant", "acme")]));

        let end = Utc::now();
        let mut params = TraceQueryParameters::new("svc", end - Duration::hours(1), end);
        resolver.scope_query(&decision, &mut params);
        assert_eq!(params.tags.get("org").map(String::as_str), Some("acme"));
        assert!(!params.tags.contains_key("tenant"));

        assert!(!resolver.authorize(&decision, &Trace::default()));
        assert!(resolver.retain_authorized(&decision, vec![Trace::default()]).is_empty());
    }
}

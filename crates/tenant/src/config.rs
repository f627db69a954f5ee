/// Environment variable naming the request header that carries the tenant code.
pub const TENANT_HEADER_ENV: &str = "TRACEGATE_TENANT_HEADER";
/// Environment variable holding the admin tenant code, or `header:<name>`.
pub const ADMIN_TENANT_CODE_ENV: &str = "TRACEGATE_ADMIN_TENANT_CODE";
/// Environment variable naming the span tag used for tenant scoping.
pub const TENANT_TAG_ENV: &str = "TRACEGATE_TENANT_TAG";

/// Where the administrator tenant code comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCode {
    /// Fixed code from configuration.
    Literal(String),
    /// Read per request from the named header.
    Header(String),
}

impl Default for AdminCode {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl From<&str> for AdminCode {
    /// `header:<name>` selects a header, anything else is a literal code.
    fn from(s: &str) -> Self {
        match s.strip_prefix("header:") {
            Some(name) => Self::Header(name.trim().to_string()),
            None => Self::Literal(s.to_string()),
        }
    }
}

/// Process-wide tenancy settings. Read once at startup and handed to the
/// resolver; unset values are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenancyConfig {
    pub tenant_header: String,
    pub admin_code: AdminCode,
    pub tenant_tag: String,
}

impl TenancyConfig {
    pub fn new(
        tenant_header: impl Into<String>,
        admin_code: AdminCode,
        tenant_tag: impl Into<String>,
    ) -> Self {
        Self {
            tenant_header: tenant_header.into(),
            admin_code,
            tenant_tag: tenant_tag.into(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// - TRACEGATE_TENANT_HEADER: header carrying the caller's tenant code
    /// - TRACEGATE_ADMIN_TENANT_CODE: admin code, or `header:<name>`
    /// - TRACEGATE_TENANT_TAG: span tag key holding the tenant code
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            tenant_header: lookup(TENANT_HEADER_ENV).unwrap_or_default(),
            admin_code: lookup(ADMIN_TENANT_CODE_ENV)
                .map(|v| AdminCode::from(v.as_str()))
                .unwrap_or_default(),
            tenant_tag: lookup(TENANT_TAG_ENV).unwrap_or_default(),
        }
    }

    /// Enforcement needs both a tenant header and a tag key.
    pub fn is_enabled(&self) -> bool {
        !self.tenant_header.is_empty() && !self.tenant_tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_admin_code_from_string() {
        assert_eq!(AdminCode::from("root"), AdminCode::Literal("root".to_string()));
        assert_eq!(
            AdminCode::from("header:X-Admin-Tenant"),
            AdminCode::Header("X-Admin-Tenant".to_string())
        );
        assert_eq!(AdminCode::from(""), AdminCode::Literal(String::new()));
    }

    #[test]
    fn test_unset_config_is_disabled() {
        let config = TenancyConfig::from_lookup(|_| None);
        assert_eq!(config, TenancyConfig::default());
        assert!(!config.is_enabled());
    }

    #[test]
    fn test_needs_header_and_tag() {
        let header_only = TenancyConfig::from_lookup(lookup_from(&[(TENANT_HEADER_ENV, "X-Tenant")]));
        assert!(!header_only.is_enabled());

        let tag_only = TenancyConfig::from_lookup(lookup_from(&[(TENANT_TAG_ENV, "tenant")]));
        assert!(!tag_only.is_enabled());

        let full = TenancyConfig::from_lookup(lookup_from(&[
            (TENANT_HEADER_ENV, "X-Tenant"),
            (ADMIN_TENANT_CODE_ENV, "root"),
            (TENANT_TAG_ENV, "tenant"),
        ]));
        assert!(full.is_enabled());
        assert_eq!(full.admin_code, AdminCode::Literal("root".to_string()));
    }
}

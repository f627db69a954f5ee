// Per-request tenancy decision

/// Outcome of resolving a request's tenant.
///
/// `enforced == false` means no scoping applies: tenancy is not configured,
/// the request named no tenant, or the caller is the admin tenant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TenancyDecision {
    pub enforced: bool,
    pub tenant_code: String,
    pub is_admin: bool,
}

impl TenancyDecision {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn admin(tenant_code: impl Into<String>) -> Self {
        Self {
            enforced: false,
            tenant_code: tenant_code.into(),
            is_admin: true,
        }
    }

    pub fn enforced(tenant_code: impl Into<String>) -> Self {
        Self {
            enforced: true,
            tenant_code: tenant_code.into(),
            is_admin: false,
        }
    }
}

use tracegate_models::TraceQueryParameters;

use crate::context::TenancyDecision;

/// Constrain a search to the caller's tenant.
///
/// Sets `tags[tag_key]` to the tenant code, replacing any value the caller
/// supplied for that key. Other tags are left alone. No-op when the
/// decision is not enforced.
pub fn apply_scope(params: &mut TraceQueryParameters, decision: &TenancyDecision, tag_key: &str) {
    if !decision.enforced {
        return;
    }
    params
        .tags
        .insert(tag_key.to_string(), decision.tenant_code.clone());
}

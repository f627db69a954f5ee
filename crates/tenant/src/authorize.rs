use tracegate_models::Trace;

use crate::context::TenancyDecision;

/// Whether `trace` may be returned to the caller.
///
/// Under enforcement the trace must contain at least one span tagged
/// `tag_key = tenant_code` (string value, exact match). One matching span
/// authorizes the whole trace.
pub fn authorize(trace: &Trace, decision: &TenancyDecision, tag_key: &str) -> bool {
    if !decision.enforced {
        return true;
    }
    trace.spans.iter().any(|span| {
        span.tags
            .iter()
            .any(|tag| tag.key == tag_key && tag.value.as_str() == Some(decision.tenant_code.as_str()))
    })
}

/// Drop every trace the caller may not see. Dropped traces leave no trace
/// in the result.
pub fn retain_authorized(traces: Vec<Trace>, decision: &TenancyDecision, tag_key: &str) -> Vec<Trace> {
    if !decision.enforced {
        return traces;
    }
    traces
        .into_iter()
        .filter(|trace| authorize(trace, decision, tag_key))
        .collect()
}

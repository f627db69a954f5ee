use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tracegate_models::{Span, Trace, TraceId, TraceQueryParameters};

use super::{QueryError, QueryService};
use crate::ui::{trace_from_ui, UiTrace};

/// Read-only in-process trace store.
#[derive(Debug, Clone, Default)]
pub struct MemoryQueryService {
    traces: Vec<Trace>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    Envelope { data: Vec<UiTrace> },
    Bare(Vec<UiTrace>),
}

impl MemoryQueryService {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    /// Load traces from a JSON file in the client shape, either a bare array
    /// of traces or a `{"data": [...]}` envelope.
    pub fn from_fixture_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixtures from {}", path.display()))?;
        let fixture: FixtureFile = serde_json::from_str(&content)
            .with_context(|| format!("parsing fixtures in {}", path.display()))?;
        let ui_traces = match fixture {
            FixtureFile::Envelope { data } => data,
            FixtureFile::Bare(data) => data,
        };

        let traces = ui_traces
            .into_iter()
            .map(trace_from_ui)
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("converting fixtures in {}", path.display()))?;
        Ok(Self::new(traces))
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}

#[async_trait]
impl QueryService for MemoryQueryService {
    async fn find_traces(&self, params: &TraceQueryParameters) -> Result<Vec<Trace>, QueryError> {
        Ok(self
            .traces
            .iter()
            .filter(|trace| trace.spans.iter().any(|span| span_matches(span, params)))
            .take(params.num_traces)
            .cloned()
            .collect())
    }

    async fn get_trace(&self, trace_id: &TraceId) -> Result<Trace, QueryError> {
        self.traces
            .iter()
            .find(|trace| trace.trace_id().as_ref() == Some(trace_id))
            .cloned()
            .ok_or(QueryError::TraceNotFound)
    }
}

/// A single span has to satisfy every constraint for its trace to match.
fn span_matches(span: &Span, params: &TraceQueryParameters) -> bool {
    if !params.service_name.is_empty() && span.service_name != params.service_name {
        return false;
    }
    if let Some(op) = &params.operation_name {
        if &span.operation_name != op {
            return false;
        }
    }
    if span.start_time < params.start_time_min || span.start_time > params.start_time_max {
        return false;
    }
    if params.duration_min.is_some_and(|min| span.duration < min) {
        return false;
    }
    if params.duration_max.is_some_and(|max| span.duration > max) {
        return false;
    }
    params.tags.iter().all(|(key, value)| {
        span.tags
            .iter()
            .any(|tag| &tag.key == key && tag.value.to_string() == *value)
    })
}

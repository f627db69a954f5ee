use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracegate_models::{Trace, TraceId, TraceQueryParameters};

use super::{QueryError, QueryService};
use crate::ui::{trace_from_ui, StructuredError, UiTrace};

/// Query engine reached over HTTP, speaking the same JSON API this service
/// exposes.
#[derive(Debug, Clone)]
pub struct RemoteQueryService {
    base_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct UpstreamResponse {
    #[serde(default)]
    data: Option<Vec<UiTrace>>,
    #[serde(default)]
    errors: Option<Vec<StructuredError>>,
}

impl RemoteQueryService {
    pub fn new(base_url: &str, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// GET `url` and decode the traces it returns. A 404 is only meaningful
    /// for single-trace lookups, so callers decide what it maps to.
    async fn fetch(&self, url: &str, not_found: QueryError) -> Result<Vec<Trace>, QueryError> {
        tracing::debug!("Querying upstream {}", url);

        let resp = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| QueryError::Upstream(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(not_found);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Upstream(format!("{}: {}", status, body)));
        }

        let body: UpstreamResponse = resp
            .json()
            .await
            .map_err(|e| QueryError::Decode(e.to_string()))?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            tracing::warn!("Upstream reported {} trace errors", errors.len());
        }

        body.data
            .unwrap_or_default()
            .into_iter()
            .map(|ui| trace_from_ui(ui).map_err(|e| QueryError::Decode(e.to_string())))
            .collect()
    }
}

#[async_trait]
impl QueryService for RemoteQueryService {
    async fn find_traces(&self, params: &TraceQueryParameters) -> Result<Vec<Trace>, QueryError> {
        let query = serde_urlencoded::to_string(search_pairs(params)?)
            .map_err(|e| QueryError::Upstream(e.to_string()))?;
        let url = format!("{}/api/traces?{}", self.base_url, query);
        self.fetch(&url, QueryError::Upstream(format!("{}: search endpoint not found", url)))
            .await
    }

    async fn get_trace(&self, trace_id: &TraceId) -> Result<Trace, QueryError> {
        let url = format!("{}/api/traces/{}", self.base_url, trace_id);
        self.fetch(&url, QueryError::TraceNotFound)
            .await?
            .into_iter()
            .next()
            .ok_or(QueryError::TraceNotFound)
    }
}

/// Query-string pairs understood by the upstream search endpoint.
fn search_pairs(params: &TraceQueryParameters) -> Result<Vec<(&'static str, String)>, QueryError> {
    let mut pairs = vec![
        ("service", params.service_name.clone()),
        ("start", params.start_time_min.timestamp_micros().to_string()),
        ("end", params.start_time_max.timestamp_micros().to_string()),
        ("limit", params.num_traces.to_string()),
    ];
    if let Some(op) = &params.operation_name {
        pairs.push(("operation", op.clone()));
    }
    if !params.tags.is_empty() {
        let tags = serde_json::to_string(&params.tags).map_err(|e| QueryError::Upstream(e.to_string()))?;
        pairs.push(("tags", tags));
    }
    if let Some(min) = params.duration_min {
        pairs.push(("minDuration", format!("{}us", min.as_micros())));
    }
    if let Some(max) = params.duration_max {
        pairs.push(("maxDuration", format!("{}us", max.as_micros())));
    }
    Ok(pairs)
}

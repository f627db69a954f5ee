use crate::error::{ApiError, Result};
use crate::query_parser;
use crate::querysvc::QueryError;
use crate::ui::{trace_to_ui, StructuredError, StructuredResponse, UiTrace};
use crate::AppState;
use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use std::sync::Arc;
use tracegate_models::{Trace, TraceId};
use tracegate_tenant::TenancyDecision;

/// Search traces
/// GET /api/traces
///
/// A search that names `traceID`s is answered by ID and every trace is
/// checked against the caller's tenant; otherwise the query itself is
/// scoped to the tenant before it reaches the query engine.
pub async fn search_traces(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    RawQuery(raw): RawQuery,
) -> Result<Json<StructuredResponse<Vec<UiTrace>>>> {
    let mut query = query_parser::parse(raw.as_deref())?;
    let decision = state.tenancy.resolve(&headers);

    let (traces, errors) = if query.trace_ids.is_empty() {
        state.tenancy.scope_query(&decision, &mut query.params);
        let traces = state.query_service.find_traces(&query.params).await?;
        (traces, Vec::new())
    } else {
        traces_by_ids(&state, &decision, &query.trace_ids).await?
    };

    let data = traces.iter().map(trace_to_ui).collect();
    Ok(Json(StructuredResponse::traces(data, errors)))
}

/// Get a single trace
/// GET /api/traces/:trace_id
///
/// A trace outside the caller's tenant gets the same 404 as a missing one.
pub async fn get_trace(
    State(state): State<Arc<AppState>>,
    Path(trace_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StructuredResponse<Vec<UiTrace>>>> {
    let trace_id: TraceId = trace_id
        .parse()
        .map_err(|e: tracegate_models::TraceIdError| ApiError::BadRequest(e.to_string()))?;

    let trace = state.query_service.get_trace(&trace_id).await?;

    let decision = state.tenancy.resolve(&headers);
    if !state.tenancy.authorize(&decision, &trace) {
        tracing::debug!(trace_id = %trace_id, "Trace outside caller's tenant, reporting not found");
        return Err(ApiError::TraceNotFound);
    }

    Ok(Json(StructuredResponse::traces(vec![trace_to_ui(&trace)], Vec::new())))
}

/// Fetch each ID and keep the traces the caller may see.
///
/// Unauthorized traces are dropped without an error entry. Missing IDs get
/// a not-found entry only when no tenant is enforced, so that under
/// enforcement a missing ID and a foreign one look the same.
async fn traces_by_ids(
    state: &AppState,
    decision: &TenancyDecision,
    trace_ids: &[TraceId],
) -> Result<(Vec<Trace>, Vec<StructuredError>)> {
    let mut traces = Vec::with_capacity(trace_ids.len());
    let mut errors = Vec::new();

    for trace_id in trace_ids {
        match state.query_service.get_trace(trace_id).await {
            Ok(trace) => {
                if state.tenancy.authorize(decision, &trace) {
                    traces.push(trace);
                } else {
                    tracing::debug!(trace_id = %trace_id, "Dropping trace outside caller's tenant");
                }
            }
            Err(QueryError::TraceNotFound) => {
                if !decision.enforced {
                    errors.push(StructuredError {
                        code: StatusCode::NOT_FOUND.as_u16(),
                        msg: ApiError::TraceNotFound.to_string(),
                        trace_id: Some(*trace_id),
                    });
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok((traces, errors))
}

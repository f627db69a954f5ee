//! Client-facing JSON shape for traces.
//!
//! Converts model traces into the shape the query UI consumes and back
//! (the latter for upstream responses and fixture files).

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracegate_models::{Span, SpanId, Tag, TagValue, Trace, TraceId};

#[derive(Debug, Error)]
pub enum UiError {
    #[error("unknown tag type '{0}'")]
    UnknownTagType(String),

    #[error("invalid {kind} value for tag '{key}'")]
    InvalidTagValue { key: String, kind: String },

    #[error("span {0} references unknown process '{1}'")]
    UnknownProcess(SpanId, String),

    #[error("span {0} has an out-of-range timestamp or duration")]
    InvalidTiming(SpanId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiTrace {
    #[serde(rename = "traceID")]
    pub trace_id: TraceId,
    pub spans: Vec<UiSpan>,
    #[serde(default)]
    pub processes: BTreeMap<String, UiProcess>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSpan {
    #[serde(rename = "traceID")]
    pub trace_id: TraceId,
    #[serde(rename = "spanID")]
    pub span_id: SpanId,
    #[serde(default)]
    pub references: Vec<UiReference>,
    #[serde(rename = "operationName")]
    pub operation_name: String,
    /// Microseconds since the Unix epoch.
    #[serde(rename = "startTime")]
    pub start_time: i64,
    /// Microseconds.
    pub duration: i64,
    #[serde(default)]
    pub tags: Vec<UiKeyValue>,
    #[serde(rename = "processID")]
    pub process_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiReference {
    #[serde(rename = "refType")]
    pub ref_type: String,
    #[serde(rename = "traceID")]
    pub trace_id: TraceId,
    #[serde(rename = "spanID")]
    pub span_id: SpanId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiProcess {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    #[serde(default)]
    pub tags: Vec<UiKeyValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiKeyValue {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub value: Value,
}

/// Error entry inside a [`StructuredResponse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredError {
    pub code: u16,
    pub msg: String,
    #[serde(rename = "traceID", default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<TraceId>,
}

/// Response envelope shared by every trace endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct StructuredResponse<T> {
    pub data: T,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub errors: Vec<StructuredError>,
}

impl StructuredResponse<Vec<UiTrace>> {
    pub fn traces(data: Vec<UiTrace>, errors: Vec<StructuredError>) -> Self {
        Self {
            total: data.len(),
            data,
            limit: 0,
            offset: 0,
            errors,
        }
    }
}

impl StructuredResponse<Value> {
    pub fn error(code: u16, msg: impl Into<String>) -> Self {
        Self {
            data: Value::Null,
            total: 0,
            limit: 0,
            offset: 0,
            errors: vec![StructuredError {
                code,
                msg: msg.into(),
                trace_id: None,
            }],
        }
    }
}

const CHILD_OF: &str = "CHILD_OF";

pub fn trace_to_ui(trace: &Trace) -> UiTrace {
    // One process entry per service, numbered in order of first appearance.
    let mut process_ids: BTreeMap<&str, String> = BTreeMap::new();
    let mut processes = BTreeMap::new();
    let mut spans = Vec::with_capacity(trace.spans.len());

    for span in &trace.spans {
        let next_id = format!("p{}", process_ids.len() + 1);
        let process_id = process_ids
            .entry(span.service_name.as_str())
            .or_insert_with(|| {
                processes.insert(
                    next_id.clone(),
                    UiProcess {
                        service_name: span.service_name.clone(),
                        tags: Vec::new(),
                    },
                );
                next_id
            })
            .clone();

        spans.push(UiSpan {
            trace_id: span.trace_id,
            span_id: span.span_id,
            references: span
                .parent_span_id
                .map(|parent| UiReference {
                    ref_type: CHILD_OF.to_string(),
                    trace_id: span.trace_id,
                    span_id: parent,
                })
                .into_iter()
                .collect(),
            operation_name: span.operation_name.clone(),
            start_time: span.start_time.timestamp_micros(),
            duration: i64::try_from(span.duration.as_micros()).unwrap_or(i64::MAX),
            tags: span.tags.iter().map(tag_to_ui).collect(),
            process_id,
        });
    }

    UiTrace {
        trace_id: trace.trace_id().unwrap_or(TraceId::new(0, 0)),
        spans,
        processes,
    }
}

pub fn trace_from_ui(ui: UiTrace) -> Result<Trace, UiError> {
    let mut spans = Vec::with_capacity(ui.spans.len());
    for span in ui.spans {
        let service_name = ui
            .processes
            .get(&span.process_id)
            .map(|p| p.service_name.clone())
            .ok_or_else(|| UiError::UnknownProcess(span.span_id, span.process_id.clone()))?;
        let start_time = DateTime::from_timestamp_micros(span.start_time)
            .ok_or(UiError::InvalidTiming(span.span_id))?;
        let duration = u64::try_from(span.duration)
            .map(Duration::from_micros)
            .map_err(|_| UiError::InvalidTiming(span.span_id))?;
        let parent_span_id = span
            .references
            .iter()
            .find(|r| r.ref_type == CHILD_OF)
            .map(|r| r.span_id);
        let tags = span
            .tags
            .into_iter()
            .map(tag_from_ui)
            .collect::<Result<Vec<_>, _>>()?;

        spans.push(Span {
            trace_id: span.trace_id,
            span_id: span.span_id,
            parent_span_id,
            operation_name: span.operation_name,
            service_name,
            start_time,
            duration,
            tags,
        });
    }
    Ok(Trace::new(spans))
}

fn tag_to_ui(tag: &Tag) -> UiKeyValue {
    let value = match &tag.value {
        TagValue::String(s) => Value::from(s.as_str()),
        TagValue::Bool(b) => Value::from(*b),
        TagValue::Int64(i) => Value::from(*i),
        TagValue::Float64(f) => Value::from(*f),
        TagValue::Binary(bytes) => Value::from(hex::encode(bytes)),
    };
    UiKeyValue {
        key: tag.key.clone(),
        kind: tag.value.kind().to_string(),
        value,
    }
}

fn tag_from_ui(kv: UiKeyValue) -> Result<Tag, UiError> {
    let invalid = || UiError::InvalidTagValue {
        key: kv.key.clone(),
        kind: kv.kind.clone(),
    };
    let value = match kv.kind.as_str() {
        "string" => TagValue::String(kv.value.as_str().ok_or_else(invalid)?.to_string()),
        "bool" => TagValue::Bool(kv.value.as_bool().ok_or_else(invalid)?),
        "int64" => TagValue::Int64(match &kv.value {
            Value::String(s) => s.parse().map_err(|_| invalid())?,
            other => other.as_i64().ok_or_else(invalid)?,
        }),
        "float64" => TagValue::Float64(kv.value.as_f64().ok_or_else(invalid)?),
        "binary" => TagValue::Binary(
            kv.value
                .as_str()
                .and_then(|s| hex::decode(s).ok())
                .ok_or_else(invalid)?,
        ),
        other => return Err(UiError::UnknownTagType(other.to_string())),
    };
    Ok(Tag::new(kv.key, value))
}

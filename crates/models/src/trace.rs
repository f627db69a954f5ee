use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;

use crate::ids::{SpanId, TraceId};

/// Typed tag value. Only `String` values take part in tenant matching.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Binary(Vec<u8>),
}

impl TagValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Wire name of the value kind, as used by the client JSON shape.
    pub fn kind(&self) -> &'static str {
        match self {
            TagValue::String(_) => "string",
            TagValue::Bool(_) => "bool",
            TagValue::Int64(_) => "int64",
            TagValue::Float64(_) => "float64",
            TagValue::Binary(_) => "binary",
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::String(s) => f.write_str(s),
            TagValue::Bool(b) => write!(f, "{}", b),
            TagValue::Int64(i) => write!(f, "{}", i),
            TagValue::Float64(v) => write!(f, "{}", v),
            TagValue::Binary(bytes) => f.write_str(&hex::encode(bytes)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub key: String,
    pub value: TagValue,
}

impl Tag {
    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: TagValue::String(value.into()),
        }
    }

    pub fn new(key: impl Into<String>, value: TagValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub operation_name: String,
    pub service_name: String,
    pub start_time: DateTime<Utc>,
    pub duration: Duration,
    pub tags: Vec<Tag>,
}

impl Span {
    /// String value of the tag with `key`, if the span carries one.
    pub fn tag_str(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .filter(|t| t.key == key)
            .find_map(|t| t.value.as_str())
    }
}

/// A distributed operation: spans in the order storage returned them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trace {
    pub spans: Vec<Span>,
}

impl Trace {
    pub fn new(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    pub fn trace_id(&self) -> Option<TraceId> {
        self.spans.first().map(|s| s.trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span_with_tags(tags: Vec<Tag>) -> Span {
        Span {
            trace_id: TraceId::new(0, 1),
            span_id: SpanId(1),
            parent_span_id: None,
            operation_name: "GET /orders".to_string(),
            service_name: "orders".to_string(),
            start_time: Utc::now(),
            duration: Duration::from_millis(5),
            tags,
        }
    }

    #[test]
    fn test_tag_str_ignores_non_string_values() {
        let span = span_with_tags(vec![
            Tag::new("tenant", TagValue::Int64(7)),
            Tag::string("http.method", "GET"),
        ]);
        assert_eq!(span.tag_str("tenant"), None);
        assert_eq!(span.tag_str("http.method"), Some("GET"));
    }

    #[test]
    fn test_tag_value_display() {
        assert_eq!(TagValue::Bool(true).to_string(), "true");
        assert_eq!(TagValue::Int64(-3).to_string(), "-3");
        assert_eq!(TagValue::Binary(vec![0xca, 0xfe]).to_string(), "cafe");
        assert_eq!(TagValue::String("acme".into()).to_string(), "acme");
    }

    #[test]
    fn test_trace_id_of_empty_trace() {
        assert_eq!(Trace::default().trace_id(), None);
        let trace = Trace::new(vec![span_with_tags(vec![])]);
        assert_eq!(trace.trace_id(), Some(TraceId::new(0, 1)));
    }
}

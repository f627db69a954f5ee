use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

/// Result cap applied when the caller does not ask for one.
pub const DEFAULT_NUM_TRACES: usize = 100;

/// Search constraints handed to the query engine.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceQueryParameters {
    pub service_name: String,
    pub operation_name: Option<String>,
    /// Tag equality constraints, one value per key.
    pub tags: BTreeMap<String, String>,
    pub start_time_min: DateTime<Utc>,
    pub start_time_max: DateTime<Utc>,
    pub duration_min: Option<Duration>,
    pub duration_max: Option<Duration>,
    pub num_traces: usize,
}

impl TraceQueryParameters {
    pub fn new(
        service_name: impl Into<String>,
        start_time_min: DateTime<Utc>,
        start_time_max: DateTime<Utc>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            operation_name: None,
            tags: BTreeMap::new(),
            start_time_min,
            start_time_max,
            duration_min: None,
            duration_max: None,
            num_traces: DEFAULT_NUM_TRACES,
        }
    }
}

// Domain types shared by the tenant layer and the query API

pub mod ids;
pub mod query;
pub mod trace;

// Re-export commonly used types
pub use ids::{SpanId, TraceId, TraceIdError};
pub use query::{TraceQueryParameters, DEFAULT_NUM_TRACES};
pub use trace::{Span, Tag, TagValue, Trace};

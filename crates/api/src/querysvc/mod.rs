//! Query engine collaborators.
//!
//! The tenant layer never talks to storage directly; handlers go through
//! [`QueryService`], which either forwards to an upstream query API or
//! serves traces held in memory.

mod memory;
mod remote;

pub use memory::MemoryQueryService;
pub use remote::RemoteQueryService;

use async_trait::async_trait;
use thiserror::Error;
use tracegate_models::{Trace, TraceId, TraceQueryParameters};

#[derive(Debug, Error)]
pub enum QueryError {
    /// The engine has no trace with the requested ID.
    #[error("trace not found")]
    TraceNotFound,

    #[error("upstream query failed: {0}")]
    Upstream(String),

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait QueryService: Send + Sync {
    async fn find_traces(&self, params: &TraceQueryParameters) -> Result<Vec<Trace>, QueryError>;

    async fn get_trace(&self, trace_id: &TraceId) -> Result<Trace, QueryError>;
}

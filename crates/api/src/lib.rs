// Tracegate query API
// Trace search and lookup endpoints with per-tenant isolation

pub mod config;
pub mod error;
pub mod handlers;
pub mod query_parser;
pub mod querysvc;
pub mod routes;
pub mod ui;

use querysvc::QueryService;
use std::sync::Arc;
use tracegate_tenant::TenancyResolver;

/// Shared application state available to all request handlers.
pub struct AppState {
    pub tenancy: TenancyResolver,
    pub query_service: Arc<dyn QueryService>,
}

impl AppState {
    pub fn new(tenancy: TenancyResolver, query_service: Arc<dyn QueryService>) -> Self {
        Self {
            tenancy,
            query_service,
        }
    }
}

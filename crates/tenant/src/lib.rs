// Tenant isolation for trace queries
// Resolves the caller's tenant from request headers, scopes searches to it
// and authorizes traces fetched by ID.

pub mod authorize;
pub mod config;
pub mod context;
pub mod resolver;
pub mod scope;

pub use authorize::{authorize, retain_authorized};
pub use config::{AdminCode, TenancyConfig};
pub use context::TenancyDecision;
pub use resolver::TenancyResolver;
pub use scope::apply_scope;

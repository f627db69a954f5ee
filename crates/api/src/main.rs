// Tracegate API Server
// Entry point for the tenant-isolating trace query API

use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tracegate_api::config::{Backend, Config};
use tracegate_api::querysvc::{MemoryQueryService, QueryService, RemoteQueryService};
use tracegate_api::{routes, AppState};
use tracegate_tenant::{AdminCode, TenancyResolver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracegate_api=info,tracegate_tenant=info,tower_http=info".into()),
        )
        .init();

    let config = Config::load();

    tracing::info!("Tracegate API starting");
    tracing::info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Listen:  {}", config.listen);

    if config.tenancy.is_enabled() {
        // The admin code itself is a credential and stays out of the logs.
        let admin_source = match &config.tenancy.admin_code {
            AdminCode::Literal(code) if code.is_empty() => "none".to_string(),
            AdminCode::Literal(_) => "configured code".to_string(),
            AdminCode::Header(name) => format!("header {}", name),
        };
        tracing::info!(
            "  Tenancy: header={} tag={} admin={}",
            config.tenancy.tenant_header,
            config.tenancy.tenant_tag,
            admin_source
        );
    } else {
        tracing::info!("  Tenancy: disabled");
    }

    let query_service: Arc<dyn QueryService> = match &config.backend {
        Backend::Upstream(url) => {
            tracing::info!("  Upstream: {}", url);
            Arc::new(RemoteQueryService::new(url, reqwest::Client::new()))
        }
        Backend::Fixtures(path) => {
            let store = MemoryQueryService::from_fixture_file(path)?;
            tracing::info!("  Fixtures: {} traces from {}", store.len(), path.display());
            Arc::new(store)
        }
        Backend::Empty => {
            tracing::warn!("No upstream or fixtures configured, serving an empty trace store");
            Arc::new(MemoryQueryService::default())
        }
    };

    let state = Arc::new(AppState::new(
        TenancyResolver::new(config.tenancy.clone()),
        query_service,
    ));
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("binding to {}", config.listen))?;

    tracing::info!("Tracegate API listening on {}", config.listen);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

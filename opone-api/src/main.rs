//! OpOne API Server Entry Point
//!
//! Bootstraps configuration, constructs the single process-wide query
//! cache, and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use opone_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AuthConfig, DbClient, DbConfig, QueryCache,
};
use opone_cache::TtlCache;
use opone_core::ConfigError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ApiResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();

    // The one query cache for this process. CachedDbClient and the metrics
    // service both receive it through the router builder.
    let cache: Arc<QueryCache> = Arc::new(TtlCache::new(api_config.cache_default_ttl));
    cache.clone().start_auto_cleanup(api_config.cache_sweep_interval);

    let app: Router = create_api_router(db, cache, &api_config, auth_config)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting OpOne API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("OPONE_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("OPONE_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str.parse::<u16>().map_err(|_| {
        ConfigError::InvalidValue {
            field: "OPONE_API_PORT".to_string(),
            value: port_str.clone(),
            reason: "not a valid port number".to_string(),
        }
    })?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>().map_err(|e| {
        ConfigError::InvalidValue {
            field: "OPONE_API_BIND".to_string(),
            value: addr,
            reason: e.to_string(),
        }
        .into()
    })
}

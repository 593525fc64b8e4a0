//! Shopwright API server entrypoint.

use axum::Router;
use shopwright_api::{
    create_api_router, init_tracing, tenancy::bootstrap_platform_schema, ApiConfig, ApiError,
    ApiResult, Backends, DbConfig, PgTransactionSource, TelemetryConfig,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let db_config = DbConfig::from_env();
    let pool = db_config.create_pool()?;

    bootstrap_platform_schema(&PgTransactionSource::new(pool.clone())).await?;

    let api_config = ApiConfig::from_env();
    let app: Router = create_api_router(Backends::postgres(pool), &api_config)?;

    let addr = api_config.bind_addr()?;
    tracing::info!(%addr, "Starting Shopwright API server");

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

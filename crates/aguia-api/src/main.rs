mod auth;
mod config;
mod error;
mod rate_limit;
mod routes;

use std::sync::Arc;

use aguia_core::PreferenceService;
use config::AppConfig;
use routes::{app_router, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Only load .env in development; production uses platform-native env injection.
    #[cfg(debug_assertions)]
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("aguia_api=info".parse()?))
        .init();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!("Starting aguia-api with config: {:?}", config);

    let service = PreferenceService::open_path(config.database_path.clone()).await?;
    let state = AppState::new(config, service);
    let bind_addr = state.config.bind_addr.clone();
    let router = app_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("aguia-api listening on {}", bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

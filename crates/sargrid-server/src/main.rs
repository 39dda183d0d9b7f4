mod api;
mod middleware;
mod storage;

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    middleware::{AuthState, RateLimitState},
    storage::GridStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = sargrid_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = sargrid_db::PoolConfig::from_app_config(&config);
    let pool = sargrid_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = sargrid_db::run_migrations(&pool).await?;
    if applied > 0 {
        tracing::info!(applied, "applied pending database migrations");
    }

    let storage = GridStore::new(config.storage_root.clone());
    storage.ensure_layout().await?;

    let auth = AuthState::from_env(matches!(config.env, sargrid_core::Environment::Development))?;
    let rate_limit = RateLimitState::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    );

    let state = AppState {
        pool,
        storage,
        gpx_creator: config.gpx_creator.clone(),
    };
    let app = build_app(state, auth, rate_limit);

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting sargrid server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

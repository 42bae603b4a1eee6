mod api;
mod cache;
mod middleware;
mod scheduler;

use std::sync::Arc;

use custard_scraper::{Aggregator, ChromeConfig, ChromeRenderer};
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState},
    cache::FlavorCache,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = custard_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(?config, "loaded configuration");

    let renderer = Arc::new(ChromeRenderer::new(ChromeConfig::from_app_config(&config)));
    let aggregator = Aggregator::from_config(&config, renderer)?;
    tracing::info!(sites = ?aggregator.site_ids(), "scraper ready");
    let cache = Arc::new(FlavorCache::new(Arc::new(aggregator)));

    let _scheduler = scheduler::build_scheduler(Arc::clone(&cache), &config.refresh_cron).await?;

    let app = build_app(AppState {
        cache,
        static_dir: config.static_dir.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
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

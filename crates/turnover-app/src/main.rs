use std::sync::Arc;
use std::time::Duration;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};
use turnover_app::app::api::routes;
use turnover_app::config::ConfigHandler;
use turnover_app::db_handler::DbProviderHandler;
use turnover_app::sync_handler::SyncEngineHandler;
use turnover_core::config::load_config;
use turnover_db::db::connection::create_pool;
use turnover_db::db::migrate::run_migrations;
use turnover_service::feed::HttpFeedSource;
use turnover_service::sync::{SyncEngine, schedule};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting turnover server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    run_migrations(&config.database.url).await?;

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let source = HttpFeedSource::new(&config.sync)?;
    let engine = Arc::new(SyncEngine::new(Arc::new(source), &config.sync)?);
    let scheduler = schedule::spawn(
        Arc::clone(&engine),
        Arc::new(pool.clone()),
        Duration::from_secs(config.sync.interval_secs),
    );

    let bind_addr = config.server.bind_addr();
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler::new(config.clone()))
        .hoop(SyncEngineHandler { engine })
        .push(routes()?);

    tracing::info!("Server listening on {bind_addr}");

    let server = salvo::Server::new(acceptor);
    let handle = server.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown requested");
        handle.stop_graceful(None);
    });

    server.serve(router).await;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }

    Ok(())
}

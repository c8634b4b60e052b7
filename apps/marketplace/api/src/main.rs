use axum_helpers::server::{ShutdownCoordinator, create_production_app, health_router};
use core_config::FromEnv;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::providers::{MockProvider, SmtpConfig, SmtpProvider};
use domain_notifications::{ChannelNotifier, EmailProvider, OrderConfirmationWorker};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::{Config, EmailProviderKind};
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;

    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, env!("CARGO_PKG_NAME"))
            .await
            .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    }

    // Order confirmations leave the request path through a bounded queue
    let provider: Arc<dyn EmailProvider> = match config.notifications.provider {
        EmailProviderKind::Smtp => Arc::new(SmtpProvider::new(SmtpConfig::from_env()?)?),
        EmailProviderKind::Mock => Arc::new(MockProvider::new()),
    };
    let (notifier, receiver) = ChannelNotifier::channel(config.notifications.queue_capacity);
    let worker = OrderConfirmationWorker::with_config(
        receiver,
        provider,
        config.notifications.worker.clone(),
    )?;

    let workers = ShutdownCoordinator::new();
    let worker_handle = tokio::spawn(worker.run(workers.subscribe()));

    let state = AppState {
        config,
        db,
        notifier: Arc::new(notifier),
    };

    let api_routes = api::routes(&state);

    // create_router adds docs/middleware to our composed routes
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes).await?;

    // - /health: liveness with app name/version
    // - /ready: database ping
    let app = router
        .merge(health_router(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")))
        .merge(api::ready_router(state.clone()));

    let server_config = state.config.server.clone();
    let db = state.db;

    info!("Starting marketplace API with graceful shutdown (30s timeout)");

    create_production_app(
        app,
        &server_config,
        Duration::from_secs(30),
        async move {
            drain_confirmations(workers, worker_handle).await;

            match db.close().await {
                Ok(_) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Marketplace API shutdown complete");
    Ok(())
}

/// Stop the confirmation worker once it has sent everything already queued.
///
/// Runs after the server has drained, so no request can enqueue afterwards.
async fn drain_confirmations(workers: ShutdownCoordinator, worker: JoinHandle<()>) {
    info!("Shutting down: draining order confirmations");
    workers.shutdown();
    if let Err(e) = worker.await {
        tracing::error!("Order confirmation worker panicked: {}", e);
    }
}

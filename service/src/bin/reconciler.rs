//! Reconciliation worker.
//!
//! Periodically overwrites the fast-store stock counters from the durable
//! store, bounding the drift that partial failures introduce. Runs until
//! ctrl-c.

use flashsale_service::config::Config;
use flashsale_service::reconciliation::ReconciliationJob;
use flashsale_service::resources::ResourceManager;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flashsale_service=info,flashsale_redis=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting stock reconciliation worker");

    // Load configuration
    let config = Config::from_env();
    info!(
        postgres_url = %config.postgres.url,
        redis_url = %config.redis.url,
        interval_secs = config.reconciliation.interval_secs,
        "Configuration loaded"
    );

    let resources = ResourceManager::from_config(&config).await?;

    let job = ReconciliationJob::new(
        resources.repository.clone(),
        resources.stock_store.clone(),
        resources.lock_manager.clone(),
        Duration::from_secs(config.reconciliation.interval_secs),
        config.locking.policy().ttl,
    );

    info!("Reconciliation worker running; press ctrl-c to stop");
    job.run(async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for shutdown signal");
        }
    })
    .await;

    info!("Reconciliation worker stopped");
    Ok(())
}

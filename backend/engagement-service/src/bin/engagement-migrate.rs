use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use engagement_service::config::Config;
use engagement_service::store::PostgresStore;

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,engagement_service=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.app.json_logs);

    let database = config.require_database()?;
    info!(env = %config.app.env, "applying engagement-service migrations");

    let store = PostgresStore::connect(database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    store
        .migrate()
        .await
        .context("Failed to apply migrations")?;

    info!("migrations applied");
    Ok(())
}

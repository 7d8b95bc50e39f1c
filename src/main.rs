use std::sync::Arc;

use hapas_store::api::accounts::bootstrap_admin;
use hapas_store::api::routes::{AppState, app_router};
use hapas_store::config::Config;
use hapas_store::persistence;
use hapas_store::store::Store;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (db, mut store) = match &config.database_url {
        Some(url) => {
            let pool = persistence::create_pool_and_migrate(url).await?;
            let store = persistence::load_store(&pool).await?;
            (Some(pool), store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; running with in-memory storage only");
            (None, Store::default())
        }
    };

    if let Some(bootstrap) = &config.admin_bootstrap {
        bootstrap_admin(&mut store, db.as_ref(), bootstrap).await?;
    }

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "hapas store listening");

    let state = AppState {
        store: store.shared(),
        db,
        config: Arc::new(config),
    };
    axum::serve(listener, app_router(state)).await?;
    Ok(())
}

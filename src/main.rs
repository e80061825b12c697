use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tennis_matches_api::config::{Settings, StoreSettings};
use tennis_matches_api::db::{CosmosStore, MatchStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting tennis matches API...");

    dotenvy::dotenv().ok();

    let settings = Settings::from_env().inspect_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
    })?;

    let store: Arc<dyn MatchStore> = match &settings.store {
        StoreSettings::Cosmos(cosmos) => {
            let store = CosmosStore::new(cosmos).inspect_err(|e| {
                tracing::error!("Failed to set up Cosmos DB client: {}", e);
            })?;
            tracing::info!(
                "Using Cosmos DB container '{}' in database '{}'",
                cosmos.container,
                cosmos.database
            );
            Arc::new(store)
        }
        StoreSettings::Sqlite { database_url } => {
            let store = SqliteStore::connect(database_url).await.inspect_err(|e| {
                tracing::error!("Failed to connect to SQLite database: {}", e);
            })?;
            tracing::info!("SQLite database connection established.");
            Arc::new(store)
        }
    };

    let app = tennis_matches_api::app(store);

    let listener = tokio::net::TcpListener::bind(settings.addr).await?;

    tracing::info!("Server listening on {}", settings.addr);

    axum::serve(listener, app).await?;

    Ok(())
}

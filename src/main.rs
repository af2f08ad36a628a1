use std::sync::Arc;

use dotenvy::dotenv;
use englishcard::{
    config::Config,
    database::{connection::Connection, memory::MemoryStore, WordStore},
    schema::dispatch,
    telemetry::init_tracing,
};
use teloxide::Bot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_level)?;

    let bot = Bot::new(&config.teloxide_token);
    tracing::info!("Starting bot...");

    match &config.database_url {
        Some(connection_string) => {
            let connection = Connection::connect(connection_string, config.max_connections).await?;
            let seeded = connection.prepare().await?;
            tracing::info!("Database ready, {} seed words added", seeded);
            dispatch(bot, Arc::new(connection), config.webhook).await
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, words will only be kept in memory");
            let store = MemoryStore::new();
            let seeded = store.seed_defaults().await?;
            tracing::info!("In-memory store ready, {} seed words added", seeded);
            dispatch(bot, Arc::new(store), config.webhook).await
        }
    }
}

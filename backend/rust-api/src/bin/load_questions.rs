use anyhow::Context;
use tracing_subscriber::fmt::init;

use mathquiz_api::{
    config::Config,
    models::QuestionSeed,
    services::question_store::QuestionStore,
};

/// Seed loader: reads a JSON array of question records and replaces the
/// entire question store with it. A record missing a required field or
/// carrying a bad correct-option letter aborts the run before anything is
/// written.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/math_questions.json".to_string());

    let config = Config::load().expect("Failed to load configuration");

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read seed file {}", path))?;
    let seeds: Vec<QuestionSeed> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid seed record in {}", path))?;

    tracing::info!("Parsed {} seed records from {}", seeds.len(), path);

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to MongoDB");

    let store = QuestionStore::new(mongo_client.database(&config.mongo_database));
    let count = store.load(seeds).await?;

    tracing::info!("Successfully loaded {} questions", count);

    Ok(())
}

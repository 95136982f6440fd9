use axum::Router;
use std::sync::Arc;

use mathquiz_api::{
    config::Config,
    models::QuestionSeed,
    services::{question_store::QuestionStore, AppState},
    create_router,
};

/// Builds the app against the test databases with a deterministic
/// three-question store. The LLM endpoint is pointed at an unroutable
/// address so no test ever talks to a real provider; explanation content
/// degrades to the fixed fallback, which is what the tests assert on.
pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    // Quiz covers the whole fixture store; port 9 never answers HTTP
    std::env::set_var("QUIZ_SAMPLE_SIZE", "3");
    std::env::set_var("LLM_API_URL", "http://127.0.0.1:9");

    // Load test configuration
    let config = Config::load().expect("Failed to load test configuration");

    eprintln!("Test config loaded - Redis URI: {}", config.redis_uri);

    // Connect to test databases
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let redis_client =
        redis::Client::open(config.redis_uri.clone()).expect("Failed to create test Redis client");

    // Create app state (connection is established inside)
    let app_state = Arc::new(
        AppState::new(config.clone(), mongo_client.clone(), redis_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    // Seed test data
    seed_questions(&mongo_client, &config.mongo_database).await;

    // Build test router (same as main app)
    create_router(app_state)
}

/// Replaces the question store with the fixture set: ids 1..=3 with
/// correct letters A, B, C.
async fn seed_questions(mongo_client: &mongodb::Client, db_name: &str) {
    let store = QuestionStore::new(mongo_client.database(db_name));

    let raw = serde_json::json!([
        {
            "question_text": "What is 3 + 4?",
            "option_a": "7",
            "option_b": "8",
            "option_c": "9",
            "option_d": "10",
            "correct_option": "A",
            "topic": "arithmetic"
        },
        {
            "question_text": "What is 5 * 6?",
            "option_a": "25",
            "option_b": "30",
            "option_c": "35",
            "option_d": "40",
            "correct_option": "B",
            "topic": "arithmetic"
        },
        {
            "question_text": "What is 10 - 7?",
            "option_a": "1",
            "option_b": "2",
            "option_c": "3",
            "option_d": "4",
            "correct_option": "C",
            "topic": "arithmetic"
        }
    ]);

    let seeds: Vec<QuestionSeed> = serde_json::from_value(raw).expect("fixture seeds must parse");
    store.load(seeds).await.expect("Failed to seed questions");

    eprintln!("Question fixtures seeded in MongoDB");
}

/// Pulls the signed session cookie pair out of a response.
pub fn session_cookie(response: &axum::http::Response<axum::body::Body>) -> String {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|header| header.starts_with("quiz_sid="))
        .and_then(|header| header.split(';').next())
        .expect("response must set the quiz_sid cookie")
        .to_string()
}

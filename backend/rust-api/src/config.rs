use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub redis_uri: String,
    pub session_secret: String,
    pub llm_api_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load environment variables from root .env file (two levels up)
        // Try root .env first, then fallback to local .env
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            // Fallback to current directory .env for backward compatibility
            dotenvy::dotenv().ok();
        }

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            // Load base config from TOML file
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017/mathquiz".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "mathquiz".to_string());

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string());

        let session_secret = settings
            .get_string("session.secret")
            .or_else(|_| env::var("SESSION_SECRET"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    panic!("FATAL: SESSION_SECRET must be set in production!");
                }
                eprintln!("WARNING: Using default SESSION_SECRET (dev mode only!)");
                "dev-secret-only-for-local-testing".to_string()
            });

        let llm_api_url = settings
            .get_string("llm.api_url")
            .or_else(|_| env::var("LLM_API_URL"))
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let llm_api_key = settings
            .get_string("llm.api_key")
            .or_else(|_| env::var("LLM_API_KEY"))
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .unwrap_or_else(|_| {
                // Explanations degrade to the fallback text without a key,
                // the quiz flow itself keeps working.
                eprintln!("WARNING: LLM_API_KEY is not set, explanations will use fallback text");
                String::new()
            });

        let llm_model = settings
            .get_string("llm.model")
            .or_else(|_| env::var("LLM_MODEL"))
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        Ok(Config {
            mongo_uri,
            mongo_database,
            redis_uri,
            session_secret,
            llm_api_url,
            llm_api_key,
            llm_model,
        })
    }
}

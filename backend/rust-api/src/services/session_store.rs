use anyhow::Context;
use redis::aio::ConnectionManager;

use crate::errors::QuizError;
use crate::metrics::track_session_store_operation;
use crate::models::QuizSession;

/// Redis-backed store for the per-user quiz session. One JSON value per
/// session id under a TTL'd key; the session id itself travels in an
/// HMAC-signed cookie.
pub struct SessionStore {
    redis: ConnectionManager,
    ttl_seconds: u64,
}

impl SessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self {
            redis,
            ttl_seconds: session_ttl_seconds(),
        }
    }

    fn key(session_id: &str) -> String {
        format!("quiz:session:{}", session_id)
    }

    pub async fn save(&self, session_id: &str, session: &QuizSession) -> Result<(), QuizError> {
        let mut conn = self.redis.clone();
        let key = Self::key(session_id);
        let payload =
            serde_json::to_string(session).context("Failed to serialize quiz session")?;

        track_session_store_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(self.ttl_seconds)
                .arg(payload)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to save quiz session to Redis")
        })
        .await?;

        Ok(())
    }

    /// `None` means no session: never started, expired out of Redis, or the
    /// cookie pointed at a key that is gone.
    pub async fn load(&self, session_id: &str) -> Result<Option<QuizSession>, QuizError> {
        let mut conn = self.redis.clone();
        let key = Self::key(session_id);

        let payload: Option<String> = track_session_store_operation("get", async {
            redis::cmd("GET")
                .arg(&key)
                .query_async::<Option<String>>(&mut conn)
                .await
                .context("Failed to load quiz session from Redis")
        })
        .await?;

        match payload {
            Some(raw) => {
                let session: QuizSession =
                    serde_json::from_str(&raw).context("Failed to decode quiz session")?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    pub async fn delete(&self, session_id: &str) -> Result<(), QuizError> {
        let mut conn = self.redis.clone();
        let key = Self::key(session_id);

        track_session_store_operation("del", async {
            redis::cmd("DEL")
                .arg(&key)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to delete quiz session from Redis")
        })
        .await?;

        Ok(())
    }
}

fn session_ttl_seconds() -> u64 {
    std::env::var("SESSION_DURATION_SECONDS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(3600)
}

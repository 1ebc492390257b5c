use redis_utils::SharedConnectionManager;
use std::time::Duration;
use uuid::Uuid;

use crate::error::Result;

/// Refresh tokens of live sessions, keyed `{user_id}:{jti}`
#[derive(Clone)]
pub struct TokenStore {
    redis: SharedConnectionManager,
    ttl_secs: u64,
    command_timeout: Duration,
}

impl TokenStore {
    pub fn new(redis: SharedConnectionManager, ttl_secs: u64, command_timeout: Duration) -> Self {
        Self {
            redis,
            ttl_secs,
            command_timeout,
        }
    }

    pub fn key(user_id: Uuid, jti: Uuid) -> String {
        format!("{user_id}:{jti}")
    }

    /// `SET key token EX ttl`; `Ok(true)` when Redis acknowledged the write.
    pub async fn store(&self, key: &str, refresh_token: &str) -> Result<bool> {
        let mut conn = redis_utils::connection(&self.redis).await;
        let reply: Option<String> = redis_utils::with_timeout(self.command_timeout, async {
            redis::cmd("SET")
                .arg(key)
                .arg(refresh_token)
                .arg("EX")
                .arg(self.ttl_secs)
                .query_async(&mut conn)
                .await
        })
        .await?;

        Ok(reply.as_deref() == Some("OK"))
    }

    pub async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let mut conn = redis_utils::connection(&self.redis).await;
        let token: Option<String> = redis_utils::with_timeout(self.command_timeout, async {
            redis::cmd("GET").arg(key).query_async(&mut conn).await
        })
        .await?;

        Ok(token)
    }

    /// Remove a session; `Ok(true)` if it existed.
    pub async fn revoke(&self, key: &str) -> Result<bool> {
        let mut conn = redis_utils::connection(&self.redis).await;
        let removed: i64 = redis_utils::with_timeout(self.command_timeout, async {
            redis::cmd("DEL").arg(key).query_async(&mut conn).await
        })
        .await?;

        Ok(removed > 0)
    }
}

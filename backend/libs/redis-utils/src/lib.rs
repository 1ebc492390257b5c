//! Shared Redis plumbing: a connection manager handed to every component
//! that talks to Redis, plus a timeout guard for individual commands.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Lower bound for command timeouts; anything shorter trips on normal latency.
pub const MIN_COMMAND_TIMEOUT: Duration = Duration::from_millis(500);

pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;
        let client = Client::open(info).context("failed to construct Redis client")?;
        let connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        info!("Redis connection manager initialized");
        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }
}

/// Run a Redis command, failing with an IO error if it exceeds `limit`.
pub async fn with_timeout<F, T>(limit: Duration, future: F) -> Result<T, RedisError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    match tokio::time::timeout(limit.max(MIN_COMMAND_TIMEOUT), future).await {
        Ok(res) => res,
        Err(_) => Err(RedisError::from((
            redis::ErrorKind::IoError,
            "redis command timed out",
        ))),
    }
}

/// Clone of the shared manager, so the lock is released before any command runs.
pub async fn connection(manager: &SharedConnectionManager) -> ConnectionManager {
    manager.lock().await.clone()
}

/// PING through the shared manager; used by readiness checks.
pub async fn ping(manager: &SharedConnectionManager, limit: Duration) -> Result<(), RedisError> {
    let mut conn = connection(manager).await;
    let pong: String = with_timeout(limit, redis::cmd("PING").query_async(&mut conn)).await?;
    if pong == "PONG" {
        Ok(())
    } else {
        Err(RedisError::from((
            redis::ErrorKind::ResponseError,
            "unexpected PING response",
        )))
    }
}

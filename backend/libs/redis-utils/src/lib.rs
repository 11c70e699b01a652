use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::{Client, ConnectionAddr, ConnectionInfo, IntoConnectionInfo, RedisError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;
use tracing::info;

/// Shared Redis connection manager guarded by a Tokio mutex.
pub type SharedConnectionManager = Arc<Mutex<ConnectionManager>>;

/// Upper bound for a single Redis round trip.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis connection pool backed by a reconnecting connection manager.
pub struct RedisPool {
    manager: SharedConnectionManager,
}

impl RedisPool {
    /// Connect to `redis_url` (`redis://` or `rediss://`) and verify the link with `PING`.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let info: ConnectionInfo = redis_url
            .into_connection_info()
            .context("failed to parse REDIS_URL connection string")?;

        let tls = matches!(info.addr, ConnectionAddr::TcpTls { .. });
        let client = Client::open(info).context("failed to construct Redis client")?;
        let mut connection_manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut connection_manager)
            .await
            .context("Redis PING failed")?;

        info!(tls, "Connected to Redis");

        Ok(Self {
            manager: Arc::new(Mutex::new(connection_manager)),
        })
    }

    pub fn manager(&self) -> SharedConnectionManager {
        self.manager.clone()
    }
}

/// Run a Redis command future, failing with an IO error once `deadline` passes.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> std::result::Result<T, RedisError>
where
    F: Future<Output = std::result::Result<T, RedisError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RedisError::from((
            redis::ErrorKind::IoError,
            "redis command timed out",
        ))),
    }
}

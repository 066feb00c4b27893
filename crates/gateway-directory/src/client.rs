use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),
}

/// A thin typed adapter over the shared KV store, exposing only the
/// operations the session directory and tailgator sets need (§4.1).
///
/// All operations propagate store errors; it is up to the caller
/// (`SessionDirectory`, the bootstrap/teardown paths) to decide whether an
/// error is surfaced to the client or only to the internal observability
/// channel.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn put(&self, key: &str, ttl: Duration, value: &str) -> Result<(), DirectoryError>;

    async fn get(&self, key: &str) -> Result<Option<String>, DirectoryError>;

    async fn delete(&self, key: &str) -> Result<(), DirectoryError>;

    async fn add(&self, set_key: &str, member: &str) -> Result<(), DirectoryError>;

    async fn members(&self, set_key: &str) -> Result<Vec<String>, DirectoryError>;

    /// Atomic composite: set `key` with a TTL and read the members of
    /// (possibly a different) `set_key`, in one round trip.
    async fn put_and_members(
        &self,
        key: &str,
        ttl: Duration,
        value: &str,
        set_key: &str,
    ) -> Result<Vec<String>, DirectoryError>;
}

/// Production `DirectoryClient` backed by a shared, auto-reconnecting
/// redis connection -- one cloneable handle per process, the same shape as
/// the teacher's `sqlx::PgPool`.
#[derive(Clone)]
pub struct RedisDirectoryClient {
    conn: ConnectionManager,
}

impl RedisDirectoryClient {
    pub async fn connect(redis_url: &str) -> Result<Self, DirectoryError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl DirectoryClient for RedisDirectoryClient {
    async fn put(&self, key: &str, ttl: Duration, value: &str) -> Result<(), DirectoryError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DirectoryError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), DirectoryError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn add(&self, set_key: &str, member: &str) -> Result<(), DirectoryError> {
        let mut conn = self.conn.clone();
        let _: () = conn.sadd(set_key, member).await?;
        Ok(())
    }

    async fn members(&self, set_key: &str) -> Result<Vec<String>, DirectoryError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn.smembers(set_key).await?;
        Ok(members)
    }

    async fn put_and_members(
        &self,
        key: &str,
        ttl: Duration,
        value: &str,
        set_key: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        let mut conn = self.conn.clone();
        let (members,): (Vec<String>,) = redis::pipe()
            .atomic()
            .set_ex(key, value, ttl.as_secs().max(1))
            .ignore()
            .smembers(set_key)
            .query_async(&mut conn)
            .await?;
        Ok(members)
    }
}

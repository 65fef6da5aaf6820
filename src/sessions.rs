//! Refresh-session registry.
//!
//! One entry per `(userId, tokenId)` device session, keyed
//! `refresh:{userId}:{tokenId}`, holding the currently valid refresh token
//! with a TTL. The stored entry is the sole authority on whether a presented
//! refresh token is valid: absence always means invalid. Transport failures
//! surface as errors and are never reported as absence, so a registry outage
//! can neither authenticate a request nor trigger the reuse sweep.
//!
//! The registry is injected as `Arc<dyn SessionRegistry>` so tests can
//! substitute [`InMemorySessionStore`].

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Error type for session registry operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),
}

/// Key for one device session.
pub fn session_key(user_id: Uuid, token_id: Uuid) -> String {
    format!("refresh:{}:{}", user_id, token_id)
}

/// Pattern matching every session of one user.
pub fn user_sessions_pattern(user_id: Uuid) -> String {
    format!("refresh:{}:*", user_id)
}

#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Stores or overwrites the refresh token for `(user_id, token_id)`.
    async fn put(
        &self,
        user_id: Uuid,
        token_id: Uuid,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError>;

    /// Returns the stored refresh token, or `None` when the session does not
    /// exist (revoked, rotated out under a different value, or expired).
    async fn get(&self, user_id: Uuid, token_id: Uuid) -> Result<Option<String>, SessionError>;

    /// Deletes one session entry. Deleting an absent entry is not an error.
    async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<(), SessionError>;

    /// Deletes every session of the user; returns the number removed.
    async fn revoke_all(&self, user_id: Uuid) -> Result<u64, SessionError>;
}

/// Production registry backed by Redis.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl std::fmt::Debug for RedisSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSessionStore").finish_non_exhaustive()
    }
}

impl RedisSessionStore {
    /// Connects to Redis and returns the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Connection` if the connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, SessionError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(Self { conn })
    }
}

#[async_trait]
impl SessionRegistry for RedisSessionStore {
    #[instrument(skip(self, refresh_token), fields(session.operation = "SETEX"))]
    async fn put(
        &self,
        user_id: Uuid,
        token_id: Uuid,
        refresh_token: &str,
        ttl: Duration,
    ) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let key = session_key(user_id, token_id);

        conn.set_ex::<_, _, ()>(&key, refresh_token, ttl.as_secs())
            .await?;

        debug!(session.key = %key, session.ttl_secs = %ttl.as_secs(), "Session stored");

        Ok(())
    }

    #[instrument(skip(self), fields(session.operation = "GET"))]
    async fn get(&self, user_id: Uuid, token_id: Uuid) -> Result<Option<String>, SessionError> {
        let mut conn = self.conn.clone();
        let key = session_key(user_id, token_id);

        let stored: Option<String> = conn.get(&key).await?;

        Ok(stored)
    }

    #[instrument(skip(self), fields(session.operation = "DEL"))]
    async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<(), SessionError> {
        let mut conn = self.conn.clone();
        let key = session_key(user_id, token_id);

        conn.del::<_, ()>(&key).await?;

        debug!(session.key = %key, "Session revoked");

        Ok(())
    }

    #[instrument(skip(self), fields(session.operation = "SCAN_DEL"))]
    async fn revoke_all(&self, user_id: Uuid) -> Result<u64, SessionError> {
        let mut conn = self.conn.clone();
        let pattern = user_sessions_pattern(user_id);
        let mut cursor: u64 = 0;
        let mut deleted: u64 = 0;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let count: u64 = conn.del(&keys).await?;
                deleted += count;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(user_id = %user_id, sessions.deleted = %deleted, "All sessions revoked");

        Ok(deleted)
    }
}

/// In-memory registry with real TTL semantics, substituted for Redis in
/// tests.
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use std::collections::HashMap;
    use std::time::Instant;

    use tokio::sync::RwLock;

    use super::*;

    #[derive(Debug, Default)]
    pub struct InMemorySessionStore {
        entries: RwLock<HashMap<(Uuid, Uuid), (String, Instant)>>,
    }

    impl InMemorySessionStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl SessionRegistry for InMemorySessionStore {
        async fn put(
            &self,
            user_id: Uuid,
            token_id: Uuid,
            refresh_token: &str,
            ttl: Duration,
        ) -> Result<(), SessionError> {
            let mut entries = self.entries.write().await;
            entries.insert(
                (user_id, token_id),
                (refresh_token.to_string(), Instant::now() + ttl),
            );
            Ok(())
        }

        async fn get(
            &self,
            user_id: Uuid,
            token_id: Uuid,
        ) -> Result<Option<String>, SessionError> {
            let entries = self.entries.read().await;
            Ok(entries
                .get(&(user_id, token_id))
                .filter(|(_, expires_at)| *expires_at > Instant::now())
                .map(|(token, _)| token.clone()))
        }

        async fn revoke(&self, user_id: Uuid, token_id: Uuid) -> Result<(), SessionError> {
            let mut entries = self.entries.write().await;
            entries.remove(&(user_id, token_id));
            Ok(())
        }

        async fn revoke_all(&self, user_id: Uuid) -> Result<u64, SessionError> {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|(uid, _), _| *uid != user_id);
            Ok((before - entries.len()) as u64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemorySessionStore;
    use super::*;

    #[test]
    fn test_session_key_format() {
        let user_id = Uuid::nil();
        let token_id = Uuid::nil();
        assert_eq!(
            session_key(user_id, token_id),
            format!("refresh:{}:{}", user_id, token_id)
        );
        assert!(user_sessions_pattern(user_id).ends_with(":*"));
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let token_id = Uuid::new_v4();

        store
            .put(user_id, token_id, "token-1", Duration::from_secs(60))
            .await
            .unwrap();

        let stored = store.get(user_id, token_id).await.unwrap();
        assert_eq!(stored.as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_put_overwrites_existing_entry() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let token_id = Uuid::new_v4();

        store
            .put(user_id, token_id, "token-1", Duration::from_secs(60))
            .await
            .unwrap();
        store
            .put(user_id, token_id, "token-2", Duration::from_secs(60))
            .await
            .unwrap();

        let stored = store.get(user_id, token_id).await.unwrap();
        assert_eq!(stored.as_deref(), Some("token-2"));
    }

    #[tokio::test]
    async fn test_revoke_is_idempotent() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let token_id = Uuid::new_v4();

        store
            .put(user_id, token_id, "token-1", Duration::from_secs(60))
            .await
            .unwrap();

        store.revoke(user_id, token_id).await.unwrap();
        assert!(store.get(user_id, token_id).await.unwrap().is_none());

        // Revoking again is not an error.
        store.revoke(user_id, token_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_one_user() {
        let store = InMemorySessionStore::new();
        let victim = Uuid::new_v4();
        let bystander = Uuid::new_v4();
        let ttl = Duration::from_secs(60);

        store.put(victim, Uuid::new_v4(), "a", ttl).await.unwrap();
        store.put(victim, Uuid::new_v4(), "b", ttl).await.unwrap();
        let bystander_token = Uuid::new_v4();
        store.put(bystander, bystander_token, "c", ttl).await.unwrap();

        let deleted = store.revoke_all(victim).await.unwrap();
        assert_eq!(deleted, 2);

        assert_eq!(
            store.get(bystander, bystander_token).await.unwrap().as_deref(),
            Some("c")
        );
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::new_v4();
        let token_id = Uuid::new_v4();

        store
            .put(user_id, token_id, "token-1", Duration::from_millis(20))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.get(user_id, token_id).await.unwrap().is_none());
    }
}

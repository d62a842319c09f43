use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use super::{Cache, CacheValue};
use crate::AuthError;

#[derive(Debug, Clone)]
struct Entry {
    payload: String,
    expires_at: DateTime<Utc>,
}

/// Process-local cache.
///
/// Entries are stored serialized, the same shape a networked cache would
/// hold. For multiple instances, use a shared store like redis.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// call periodically in long-running applications to prevent memory growth
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|_, entry| entry.expires_at > now);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.get(key).is_some_and(|e| e.expires_at > Utc::now()))
            .unwrap_or(false)
    }
}

fn lock_error() -> AuthError {
    AuthError::CacheError("Failed to acquire lock".to_owned())
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, AuthError> {
        let entries = self.entries.read().map_err(|_| lock_error())?;

        let Some(entry) = entries.get(key) else {
            return Ok(None);
        };
        if entry.expires_at <= Utc::now() {
            return Ok(None);
        }

        serde_json::from_str(&entry.payload)
            .map(Some)
            .map_err(|e| AuthError::CacheError(e.to_string()))
    }

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<(), AuthError> {
        let payload =
            serde_json::to_string(&value).map_err(|e| AuthError::CacheError(e.to_string()))?;

        let mut entries = self.entries.write().map_err(|_| lock_error())?;
        entries.insert(
            key.to_owned(),
            Entry {
                payload,
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut entries = self.entries.write().map_err(|_| lock_error())?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthUser;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = InMemoryCache::new();

        assert!(cache.get("user:1").await.unwrap().is_none());

        cache
            .set("user:1", CacheValue::User(AuthUser::mock()), Duration::minutes(5))
            .await
            .unwrap();
        let user = cache.get("user:1").await.unwrap().unwrap().into_user().unwrap();
        assert_eq!(user.email, "test@example.com");

        cache.delete("user:1").await.unwrap();
        assert!(cache.get("user:1").await.unwrap().is_none());

        // deleting again is fine
        cache.delete("user:1").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = InMemoryCache::new();

        let key = "whatsapp_reset:+15550109999";
        cache
            .set(key, CacheValue::ResetGrant(4), Duration::seconds(-1))
            .await
            .unwrap();
        assert!(cache.get(key).await.unwrap().is_none());
        assert!(!cache.contains(key));

        cache.cleanup_expired();
        assert!(cache.entries.read().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cached_user_drops_password_hash() {
        let cache = InMemoryCache::new();
        let user = AuthUser::mock().with_hashed_password("$argon2id$secret");

        cache
            .set("user:1", CacheValue::User(user), Duration::minutes(5))
            .await
            .unwrap();

        let cached = cache.get("user:1").await.unwrap().unwrap().into_user().unwrap();
        assert!(cached.hashed_password.is_empty());
    }
}

use std::time::Duration;

use chrono::Utc;

use super::{SessionStore, SessionValues};
use crate::cache::{Cache, user_cache_key};
use crate::events::{AuthEvent, dispatch};
use crate::tasks::{DetachedTask, spawn_detached};
use crate::AuthError;

const DEFAULT_INVALIDATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Session login and logout, with the `user:<id>` cache kept coherent.
pub struct SessionManager<S: SessionStore, C: Cache> {
    store: S,
    cache: C,
    invalidation_timeout: Duration,
}

impl<S: SessionStore, C: Cache + Clone + 'static> SessionManager<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self {
            store,
            cache,
            invalidation_timeout: DEFAULT_INVALIDATION_TIMEOUT,
        }
    }

    /// Timeout for the logout-time cache invalidation.
    #[must_use]
    pub fn with_invalidation_timeout(mut self, timeout: Duration) -> Self {
        self.invalidation_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Marks the session as belonging to `user_id`.
    ///
    /// The cache entry of whoever held this session before, and the entry of
    /// `user_id` itself, are deleted before the session is written, so the
    /// next lookup reads the current row.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session_login", skip(self), err)
    )]
    pub async fn login(&self, user_id: i64) -> Result<(), AuthError> {
        let previous = match self.store.load().await {
            Ok(values) => values.user_id,
            Err(e) => {
                log::debug!(target: "verigate::session", "msg=\"no readable session before login\" error=\"{e}\"");
                None
            }
        };

        if let Some(previous) = previous {
            self.cache.delete(&user_cache_key(previous)).await?;
        }

        let values = SessionValues::logged_in(user_id);
        self.cache.delete(&user_cache_key(user_id)).await?;
        self.store.save(&values).await?;

        dispatch(AuthEvent::LoginSuccess {
            user_id,
            at: Utc::now(),
        })
        .await;

        log::info!(target: "verigate::session", "msg=\"login\" user_id={user_id} previous_user_id={previous:?}");

        Ok(())
    }

    /// Ends the session. Never fails.
    ///
    /// The session is destroyed before returning; the user's cache entry is
    /// invalidated by a detached task, whose handle is returned so callers
    /// may wait on it if they need to.
    #[cfg_attr(feature = "tracing", tracing::instrument(name = "session_logout", skip_all))]
    pub async fn logout(&self) -> Option<DetachedTask> {
        let user_id = self
            .store
            .load()
            .await
            .ok()
            .and_then(|values| values.user_id);

        if let Err(e) = self.store.destroy().await {
            log::warn!(target: "verigate::session", "msg=\"session destroy failed during logout\" error=\"{e}\"");
        }

        let user_id = user_id?;

        dispatch(AuthEvent::LogoutSuccess {
            user_id,
            at: Utc::now(),
        })
        .await;

        log::info!(target: "verigate::session", "msg=\"logout\" user_id={user_id}");

        let cache = self.cache.clone();
        spawn_detached(
            "logout_cache_invalidation",
            self.invalidation_timeout,
            async move { cache.delete(&user_cache_key(user_id)).await },
        )
    }

    /// The authenticated user id, or `NotAuthenticated`.
    pub async fn authenticated_user_id(&self) -> Result<i64, AuthError> {
        self.store
            .load()
            .await?
            .authenticated_user_id()
            .ok_or(AuthError::NotAuthenticated)
    }

    /// Drops a session that points at a user who no longer exists, along
    /// with any cached copy of that user.
    pub async fn purge(&self, user_id: i64) -> Result<(), AuthError> {
        log::warn!(target: "verigate::session", "msg=\"purging stale session\" user_id={user_id}");
        self.store.destroy().await?;
        self.cache.delete(&user_cache_key(user_id)).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::cache::{CacheValue, InMemoryCache};
    use crate::session::MockSessionStore;
    use crate::AuthUser;

    async fn seed(cache: &InMemoryCache, user_id: i64) {
        cache
            .set(
                &user_cache_key(user_id),
                CacheValue::User(AuthUser::mock().with_id(user_id)),
                ChronoDuration::minutes(30),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_login_invalidates_both_entries() {
        let cache = InMemoryCache::new();
        seed(&cache, 1).await;
        seed(&cache, 42).await;

        let manager = SessionManager::new(MockSessionStore::logged_in(1), cache.clone());
        manager.login(42).await.unwrap();

        assert!(!cache.contains("user:1"));
        assert!(!cache.contains("user:42"));
        assert_eq!(manager.store().snapshot(), SessionValues::logged_in(42));
        assert_eq!(manager.authenticated_user_id().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_login_propagates_store_failure() {
        let store = MockSessionStore::new();
        store.set_fail_writes(true);
        let manager = SessionManager::new(store, InMemoryCache::new());

        assert!(matches!(
            manager.login(42).await,
            Err(AuthError::SessionError(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_cache() {
        let cache = InMemoryCache::new();
        seed(&cache, 42).await;

        let manager = SessionManager::new(MockSessionStore::logged_in(42), cache.clone());
        let task = manager.logout().await.unwrap();
        task.join().await;

        assert!(!manager.store().snapshot().authenticated);
        assert!(manager.store().was_destroyed());
        assert!(!cache.contains("user:42"));
        assert_eq!(
            manager.authenticated_user_id().await.unwrap_err(),
            AuthError::NotAuthenticated
        );
    }

    #[tokio::test]
    async fn test_logout_survives_backend_errors() {
        let store = MockSessionStore::logged_in(42);
        store.set_fail_writes(true);
        let manager = SessionManager::new(store, InMemoryCache::new());

        // no result to unwrap: logout cannot fail
        if let Some(task) = manager.logout().await {
            task.join().await;
        }
        assert!(!manager.store().snapshot().authenticated);

        let store = MockSessionStore::logged_in(42);
        store.set_fail_reads(true);
        store.set_fail_writes(true);
        let manager = SessionManager::new(store, InMemoryCache::new());
        assert!(manager.logout().await.is_none());
        assert!(!manager.store().snapshot().authenticated);
    }

    #[tokio::test]
    async fn test_logout_without_session() {
        let manager = SessionManager::new(MockSessionStore::new(), InMemoryCache::new());
        assert!(manager.logout().await.is_none());
    }

    #[tokio::test]
    async fn test_purge() {
        let cache = InMemoryCache::new();
        seed(&cache, 9).await;

        let manager = SessionManager::new(MockSessionStore::logged_in(9), cache.clone());
        manager.purge(9).await.unwrap();

        assert!(!cache.contains("user:9"));
        assert!(!manager.store().snapshot().authenticated);
    }
}

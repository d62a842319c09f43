use chrono::Duration;

use crate::cache::{Cache, CacheValue, user_cache_key};
use crate::session::{SessionManager, SessionStore};
use crate::{AuthError, AuthUser, UserRepository};

/// Cache-aside lookup of the user behind the current session.
///
/// Reads `user:<id>` first and falls back to the user store, repopulating the
/// cache with the configured TTL. Writes this action does not perform are not
/// seen until whoever made them deletes the entry.
pub struct GetAuthenticatedUserAction<U: UserRepository, C: Cache> {
    user_repository: U,
    cache: C,
    ttl: Duration,
}

impl<U: UserRepository, C: Cache + Clone + 'static> GetAuthenticatedUserAction<U, C> {
    pub fn new(user_repository: U, cache: C, ttl: Duration) -> Self {
        Self {
            user_repository,
            cache,
            ttl,
        }
    }

    /// # Returns
    ///
    /// - `Err(AuthError::NotAuthenticated)` - no authenticated session
    /// - `Err(AuthError::UserNotFound)` - the session points at a deleted
    ///   user; the caller must purge the session
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "get_authenticated_user", skip_all, err)
    )]
    pub async fn execute<S: SessionStore>(
        &self,
        sessions: &SessionManager<S, C>,
    ) -> Result<AuthUser, AuthError> {
        let user_id = sessions.authenticated_user_id().await?;
        self.find(user_id).await
    }

    /// The cache-aside read on its own, for callers that already hold an id.
    pub async fn find(&self, user_id: i64) -> Result<AuthUser, AuthError> {
        let key = user_cache_key(user_id);

        if let Some(value) = self.cache.get(&key).await? {
            log::trace!(target: "verigate", "msg=\"user cache hit\" user_id={user_id}");
            return value.into_user();
        }

        let user = self
            .user_repository
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.cache
            .set(&key, CacheValue::User(user.clone()), self.ttl)
            .await?;
        log::debug!(target: "verigate", "msg=\"user cache filled\" user_id={user_id}");

        Ok(user)
    }
}

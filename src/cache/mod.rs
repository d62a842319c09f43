//! TTL key/value cache used for cache-aside user lookups and short-lived
//! WhatsApp reset grants.
//!
//! Values travel as a tagged [`CacheValue`] envelope, so reading a key back as
//! the wrong kind is an error rather than a silent miscast.

mod memory;

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthUser};

pub use memory::InMemoryCache;

/// Cache key for a user record.
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

/// Cache key for the reset grant opened by a pressed WhatsApp reset button.
pub fn whatsapp_reset_key(phone_number: &str) -> String {
    format!("whatsapp_reset:{phone_number}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CacheValue {
    User(AuthUser),
    /// user id a validated reset claim was issued for
    ResetGrant(i64),
}

impl CacheValue {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(_) => "user",
            Self::ResetGrant(_) => "reset_grant",
        }
    }

    pub fn into_user(self) -> Result<AuthUser, AuthError> {
        match self {
            Self::User(user) => Ok(user),
            other => Err(AuthError::CacheError(format!(
                "expected user, found {}",
                other.kind()
            ))),
        }
    }

    pub fn into_reset_grant(self) -> Result<i64, AuthError> {
        match self {
            Self::ResetGrant(user_id) => Ok(user_id),
            other => Err(AuthError::CacheError(format!(
                "expected reset_grant, found {}",
                other.kind()
            ))),
        }
    }
}

/// implement this trait for a shared cache (redis, memcached, etc.)
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheValue>, AuthError>;

    async fn set(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<(), AuthError>;

    /// deleting a missing key is not an error
    async fn delete(&self, key: &str) -> Result<(), AuthError>;
}

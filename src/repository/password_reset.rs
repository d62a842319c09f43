use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::AuthError;

/// A stored reset token. Only the hash is persisted; the plaintext exists
/// once, in the value returned to the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Storage for hashed password-reset tokens.
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn create_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
    ) -> Result<PasswordResetToken, AuthError>;

    /// Returns the row matching `(id, user_id)` only if it was created at or
    /// after `not_before`.
    async fn find_reset_token(
        &self,
        id: i64,
        user_id: i64,
        not_before: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, AuthError>;

    /// Deletes every token the user holds and returns how many went.
    async fn delete_user_reset_tokens(&self, user_id: i64) -> Result<u64, AuthError>;
}

use chrono::{Duration, Utc};

use crate::crypto::generate_token;
use crate::{AuthError, PasswordHasher, PasswordResetRepository, SecretString};

/// A freshly issued reset token. The plaintext exists only here.
#[derive(Debug)]
pub struct IssuedResetToken {
    pub token_id: i64,
    pub token: SecretString,
}

/// Opaque one-time tokens for same-channel password resets.
///
/// Only a hash of each token is stored. Validation failures are all reported
/// as `InvalidPasswordToken`, whatever the cause.
pub struct ResetTokenService<P: PasswordResetRepository, H: PasswordHasher> {
    reset_repository: P,
    hasher: H,
    token_length: usize,
    expiry: Duration,
}

impl<P: PasswordResetRepository, H: PasswordHasher> ResetTokenService<P, H> {
    pub fn new(reset_repository: P, hasher: H, token_length: usize, expiry: Duration) -> Self {
        Self {
            reset_repository,
            hasher,
            token_length,
            expiry,
        }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Generates, hashes and stores a token for `user_id`.
    pub async fn issue(&self, user_id: i64) -> Result<IssuedResetToken, AuthError> {
        self.store(user_id, SecretString::new(generate_token(self.token_length)))
            .await
    }

    /// Stores the hash of a caller-supplied token.
    pub async fn store(
        &self,
        user_id: i64,
        token: SecretString,
    ) -> Result<IssuedResetToken, AuthError> {
        let token_hash = self.hasher.hash(token.expose_secret())?;
        let row = self
            .reset_repository
            .create_reset_token(user_id, &token_hash)
            .await?;

        log::debug!(target: "verigate", "msg=\"reset token issued\" user_id={user_id} token_id={}", row.id);

        Ok(IssuedResetToken {
            token_id: row.id,
            token,
        })
    }

    /// # Returns
    ///
    /// - `Ok(())` - the token matches a live row for this user
    /// - `Err(AuthError::InvalidPasswordToken)` - missing row, expired, or mismatch
    /// - `Err(_)` - store errors
    pub async fn validate(
        &self,
        user_id: i64,
        token_id: i64,
        token: &SecretString,
    ) -> Result<(), AuthError> {
        let not_before = Utc::now() - self.expiry;

        let Some(row) = self
            .reset_repository
            .find_reset_token(token_id, user_id, not_before)
            .await?
        else {
            log::debug!(target: "verigate", "msg=\"reset token not found or expired\" user_id={user_id} token_id={token_id}");
            return Err(AuthError::InvalidPasswordToken);
        };

        // a corrupt stored hash is reported like any other mismatch
        match self.hasher.verify(token.expose_secret(), &row.token_hash) {
            Ok(true) => Ok(()),
            Ok(false) | Err(AuthError::PasswordHashError) => {
                log::debug!(target: "verigate", "msg=\"reset token mismatch\" user_id={user_id} token_id={token_id}");
                Err(AuthError::InvalidPasswordToken)
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes every reset token the user holds.
    pub async fn revoke(&self, user_id: i64) -> Result<u64, AuthError> {
        let removed = self.reset_repository.delete_user_reset_tokens(user_id).await?;
        log::debug!(target: "verigate", "msg=\"reset tokens revoked\" user_id={user_id} count={removed}");
        Ok(removed)
    }
}

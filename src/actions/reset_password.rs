use chrono::Utc;

use super::ResetTokenService;
use crate::cache::{Cache, user_cache_key};
use crate::events::{AuthEvent, ResetChannel, dispatch};
use crate::validators::PasswordPolicy;
use crate::{
    AuthError, PasswordHasher, PasswordResetRepository, SecretString, UserRepository,
};

/// Completes an emailed reset: checks the token, sets the new password,
/// then revokes every outstanding token for the user.
pub struct ResetPasswordAction<U, P, H, C>
where
    U: UserRepository,
    P: PasswordResetRepository,
    H: PasswordHasher,
    C: Cache,
{
    user_repository: U,
    tokens: ResetTokenService<P, H>,
    hasher: H,
    cache: C,
    policy: PasswordPolicy,
}

impl<U, P, H, C> ResetPasswordAction<U, P, H, C>
where
    U: UserRepository,
    P: PasswordResetRepository,
    H: PasswordHasher,
    C: Cache,
{
    pub fn new(user_repository: U, tokens: ResetTokenService<P, H>, hasher: H, cache: C) -> Self {
        Self {
            user_repository,
            tokens,
            hasher,
            cache,
            policy: PasswordPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "reset_password", skip(self, token, new_password), err)
    )]
    pub async fn execute(
        &self,
        user_id: i64,
        token_id: i64,
        token: &SecretString,
        new_password: &SecretString,
    ) -> Result<(), AuthError> {
        self.tokens.validate(user_id, token_id, token).await?;
        self.policy.validate(new_password.expose_secret())?;

        let hashed = self.hasher.hash(new_password.expose_secret())?;
        self.user_repository.update_password(user_id, &hashed).await?;
        self.tokens.revoke(user_id).await?;
        self.cache.delete(&user_cache_key(user_id)).await?;

        dispatch(AuthEvent::PasswordResetCompleted {
            user_id,
            channel: ResetChannel::Email,
            at: Utc::now(),
        })
        .await;

        log::info!(target: "verigate", "msg=\"password reset\" user_id={user_id} channel=email");

        Ok(())
    }
}

use chrono::Utc;

use crate::cache::Cache;
use crate::events::{AuthEvent, dispatch};
use crate::session::{SessionManager, SessionStore};
use crate::validators::{normalize_phone_number, validate_email};
use crate::{AuthError, AuthUser, PasswordHasher, SecretString, UserRepository};

/// Credential login by email or phone number, ending in a session login.
pub struct LoginAction<U: UserRepository, H: PasswordHasher> {
    user_repository: U,
    hasher: H,
}

impl<U: UserRepository, H: PasswordHasher> LoginAction<U, H> {
    pub fn new(user_repository: U, hasher: H) -> Self {
        Self {
            user_repository,
            hasher,
        }
    }

    /// `identifier` containing `@` is looked up as an email, anything else
    /// as a phone number. A malformed email is never looked up.
    ///
    /// # Returns
    ///
    /// - `Ok(user)` - the session now belongs to `user`
    /// - `Err(AuthError::InvalidCredentials)` - unknown identifier or wrong
    ///   password, indistinguishably
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, err)
    )]
    pub async fn execute<S, C>(
        &self,
        sessions: &SessionManager<S, C>,
        identifier: &str,
        password: &SecretString,
    ) -> Result<AuthUser, AuthError>
    where
        S: SessionStore,
        C: Cache + Clone + 'static,
    {
        let identifier = identifier.trim();
        let user = if !identifier.contains('@') {
            self.user_repository
                .find_user_by_phone(&normalize_phone_number(identifier))
                .await?
        } else if validate_email(identifier).is_ok() {
            self.user_repository.find_user_by_email(identifier).await?
        } else {
            None
        };

        let Some(user) = user else {
            // same Argon2 cost as a password check
            let _ = self.hasher.hash(password.expose_secret());
            return Err(fail(identifier, "unknown identifier").await);
        };

        let matches = self
            .hasher
            .verify(password.expose_secret(), &user.hashed_password)
            .unwrap_or(false);
        if !matches {
            return Err(fail(identifier, "invalid password").await);
        }

        sessions.login(user.id).await?;
        Ok(user)
    }
}

async fn fail(identifier: &str, reason: &str) -> AuthError {
    log::info!(target: "verigate", "msg=\"login failed\" reason=\"{reason}\"");
    dispatch(AuthEvent::LoginFailed {
        identifier: identifier.to_owned(),
        reason: reason.to_owned(),
        at: Utc::now(),
    })
    .await;
    AuthError::InvalidCredentials
}

use chrono::Utc;

use super::ResetTokenService;
use crate::events::{AuthEvent, ResetChannel, dispatch};
use crate::validators::validate_email;
use crate::{
    AuthError, Mailer, PasswordHasher, PasswordResetRepository, SecretString, UserRepository,
};

/// Emails a reset link for a known address.
pub struct ForgotPasswordAction<U, P, H, M>
where
    U: UserRepository,
    P: PasswordResetRepository,
    H: PasswordHasher,
    M: Mailer,
{
    user_repository: U,
    tokens: ResetTokenService<P, H>,
    mailer: M,
    app_base_url: String,
}

impl<U, P, H, M> ForgotPasswordAction<U, P, H, M>
where
    U: UserRepository,
    P: PasswordResetRepository,
    H: PasswordHasher,
    M: Mailer,
{
    pub fn new(
        user_repository: U,
        tokens: ResetTokenService<P, H>,
        mailer: M,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            user_repository,
            tokens,
            mailer,
            app_base_url: app_base_url.into(),
        }
    }

    /// # Returns
    ///
    /// - `Ok(Some(token_id))` - a link was sent
    /// - `Ok(None)` - malformed email or no user with that email; callers
    ///   respond the same way as on success
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "forgot_password", skip_all, err)
    )]
    pub async fn execute(&self, email: &str) -> Result<Option<i64>, AuthError> {
        let email = email.trim();
        if validate_email(email).is_err() {
            log::debug!(target: "verigate", "msg=\"password reset for malformed email\"");
            return Ok(None);
        }

        let Some(user) = self.user_repository.find_user_by_email(email).await? else {
            log::debug!(target: "verigate", "msg=\"password reset for unknown email\"");
            return Ok(None);
        };

        let issued = self.tokens.issue(user.id).await?;
        let link = SecretString::new(format!(
            "{}/reset-password?user_id={}&token_id={}&token={}",
            self.app_base_url,
            user.id,
            issued.token_id,
            issued.token.expose_secret()
        ));

        self.mailer.send_password_reset(&user.email, &link).await?;

        dispatch(AuthEvent::PasswordResetRequested {
            user_id: user.id,
            channel: ResetChannel::Email,
            at: Utc::now(),
        })
        .await;

        log::info!(target: "verigate", "msg=\"password reset link sent\" user_id={} token_id={}", user.id, issued.token_id);

        Ok(Some(issued.token_id))
    }
}

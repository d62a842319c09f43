use chrono::Duration;

use crate::config::TokenConfig;
use crate::{AuthError, SecretString};

/// Minimum length of the signing key in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Signing key and per-purpose lifetimes.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub(crate) secret: SecretString,
    /// Default: 24 hours
    pub(crate) phone_verification_expiry: Duration,
    /// Default: 1 hour
    pub(crate) password_reset_expiry: Duration,
}

impl JwtConfig {
    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationError` if the secret is shorter than 32 bytes.
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = SecretString::new(secret);

        if secret.expose_secret().len() < MIN_SECRET_LENGTH {
            return Err(AuthError::ConfigurationError(format!(
                "JWT secret must be at least {MIN_SECRET_LENGTH} bytes, got {}",
                secret.expose_secret().len()
            )));
        }

        let tokens = TokenConfig::default();
        Ok(Self {
            secret,
            phone_verification_expiry: tokens.phone_verification_expiry,
            password_reset_expiry: tokens.whatsapp_password_reset_expiry,
        })
    }

    /// Takes both lifetimes from the application token config.
    #[must_use]
    pub fn with_token_config(mut self, tokens: &TokenConfig) -> Self {
        self.phone_verification_expiry = tokens.phone_verification_expiry;
        self.password_reset_expiry = tokens.whatsapp_password_reset_expiry;
        self
    }

    #[must_use]
    pub fn with_phone_verification_expiry(mut self, expiry: Duration) -> Self {
        self.phone_verification_expiry = expiry;
        self
    }

    #[must_use]
    pub fn with_password_reset_expiry(mut self, expiry: Duration) -> Self {
        self.password_reset_expiry = expiry;
        self
    }

    pub fn phone_verification_expiry(&self) -> Duration {
        self.phone_verification_expiry
    }

    pub fn password_reset_expiry(&self) -> Duration {
        self.password_reset_expiry
    }
}

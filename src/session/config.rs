use chrono::Duration;

use crate::{AuthError, SecretString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    #[default]
    Lax,
    Strict,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Lax => "Lax",
            Self::Strict => "Strict",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    /// Set when TLS terminates in front of the app.
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    pub session_lifetime: Duration,
    pub secret_key: SecretString,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "verigate_session".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            session_lifetime: Duration::hours(2),
            secret_key: SecretString::new(""),
        }
    }
}

impl SessionConfig {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: SecretString::new(secret_key),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.secret_key.is_empty() {
            return Err(AuthError::ConfigurationError(
                "secret_key must not be empty".to_owned(),
            ));
        }
        if self.secret_key.expose_secret().len() < 32 {
            return Err(AuthError::ConfigurationError(
                "secret_key should be at least 32 bytes".to_owned(),
            ));
        }
        if self.session_lifetime <= Duration::zero() {
            return Err(AuthError::ConfigurationError(
                "session_lifetime must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

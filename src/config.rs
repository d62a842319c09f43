//! Configuration for token lifetimes, cache TTLs and links.
//!
//! ```rust
//! use verigate::config::{TokenConfig, VerigateConfig};
//! use chrono::Duration;
//!
//! let config = VerigateConfig {
//!     tokens: TokenConfig {
//!         password_reset_expiry: Duration::minutes(30),
//!         ..Default::default()
//!     },
//!     app_base_url: "https://app.example.com".to_owned(),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use chrono::Duration;

use crate::AuthError;

/// Shortest reset token accepted by [`VerigateConfig::validate`].
pub const MIN_RESET_TOKEN_LENGTH: usize = 8;

#[derive(Debug, Clone)]
pub struct VerigateConfig {
    pub tokens: TokenConfig,

    /// Characters in a generated password-reset token.
    ///
    /// Default: 32
    pub reset_token_length: usize,

    /// TTL of the `user:<id>` cache entry.
    ///
    /// Default: 30 minutes
    pub user_cache_ttl: Duration,

    /// Upper bound on the detached cache invalidation that runs after logout.
    ///
    /// Default: 5 seconds
    pub cache_invalidation_timeout: Duration,

    /// Origin used to build reset links, without a trailing slash.
    pub app_base_url: String,
}

impl Default for VerigateConfig {
    fn default() -> Self {
        Self {
            tokens: TokenConfig::default(),
            reset_token_length: 32,
            user_cache_ttl: Duration::minutes(30),
            cache_invalidation_timeout: Duration::seconds(5),
            app_base_url: "http://localhost:8080".to_owned(),
        }
    }
}

impl VerigateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Longer lifetimes for local work.
    pub fn development() -> Self {
        Self {
            tokens: TokenConfig {
                password_reset_expiry: Duration::hours(2),
                phone_verification_expiry: Duration::days(7),
                whatsapp_password_reset_expiry: Duration::hours(2),
            },
            user_cache_ttl: Duration::minutes(5),
            ..Self::default()
        }
    }

    /// Shorter lifetimes and longer reset tokens.
    pub fn strict() -> Self {
        Self {
            tokens: TokenConfig {
                password_reset_expiry: Duration::minutes(15),
                phone_verification_expiry: Duration::hours(1),
                whatsapp_password_reset_expiry: Duration::minutes(15),
            },
            reset_token_length: 48,
            user_cache_ttl: Duration::minutes(10),
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns `AuthError::ConfigurationError` naming the first bad field.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.reset_token_length < MIN_RESET_TOKEN_LENGTH {
            return Err(AuthError::ConfigurationError(format!(
                "reset_token_length must be at least {MIN_RESET_TOKEN_LENGTH}"
            )));
        }
        if self.user_cache_ttl <= Duration::zero() {
            return Err(AuthError::ConfigurationError(
                "user_cache_ttl must be positive".to_owned(),
            ));
        }
        if self.app_base_url.ends_with('/') {
            return Err(AuthError::ConfigurationError(
                "app_base_url must not end with '/'".to_owned(),
            ));
        }
        self.tokens.validate()
    }
}

/// One explicit lifetime per token purpose.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Opaque same-channel reset tokens.
    ///
    /// Default: 1 hour
    pub password_reset_expiry: Duration,

    /// Signed phone-verification claims sent over WhatsApp.
    ///
    /// Default: 24 hours
    pub phone_verification_expiry: Duration,

    /// Signed WhatsApp password-reset claims.
    ///
    /// Default: 1 hour
    pub whatsapp_password_reset_expiry: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            password_reset_expiry: Duration::hours(1),
            phone_verification_expiry: Duration::hours(24),
            whatsapp_password_reset_expiry: Duration::hours(1),
        }
    }
}

impl TokenConfig {
    fn validate(&self) -> Result<(), AuthError> {
        let expiries = [
            ("password_reset_expiry", self.password_reset_expiry),
            ("phone_verification_expiry", self.phone_verification_expiry),
            (
                "whatsapp_password_reset_expiry",
                self.whatsapp_password_reset_expiry,
            ),
        ];

        for (name, expiry) in expiries {
            if expiry <= Duration::zero() {
                return Err(AuthError::ConfigurationError(format!(
                    "{name} must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VerigateConfig::default();

        assert_eq!(config.tokens.password_reset_expiry, Duration::hours(1));
        assert_eq!(config.tokens.phone_verification_expiry, Duration::hours(24));
        assert_eq!(
            config.tokens.whatsapp_password_reset_expiry,
            Duration::hours(1)
        );
        assert_eq!(config.reset_token_length, 32);
        assert_eq!(config.user_cache_ttl, Duration::minutes(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_validate() {
        assert!(VerigateConfig::development().validate().is_ok());
        assert!(VerigateConfig::strict().validate().is_ok());
        assert_eq!(VerigateConfig::strict().reset_token_length, 48);
    }

    #[test]
    fn test_short_reset_token_rejected() {
        let config = VerigateConfig {
            reset_token_length: 4,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuthError::ConfigurationError(ref msg)) if msg.contains("reset_token_length")
        ));
    }

    #[test]
    fn test_zero_expiry_rejected() {
        let config = VerigateConfig {
            tokens: TokenConfig {
                phone_verification_expiry: Duration::zero(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AuthError::ConfigurationError(ref msg)) if msg.contains("phone_verification_expiry")
        ));
    }

    #[test]
    fn test_trailing_slash_rejected() {
        let config = VerigateConfig {
            app_base_url: "https://app.example.com/".to_owned(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

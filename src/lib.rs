//! Session login, hashed password resets and two-channel phone verification.
//!
//! The crate authenticates users over a cookie session and proves control of a
//! phone number by asking the user to pick their code out of several decoys on
//! WhatsApp. Storage, cache, session and messaging backends are abstract
//! collaborators expressed as async traits; in-memory implementations are
//! provided for tests behind the `mocks` feature.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`session`] | signed cookie session and [`SessionManager`] login/logout |
//! | [`actions`] | cache-aside user lookup, credential login, password reset tokens |
//! | [`verification`] | phone verification and WhatsApp password reset protocol |
//! | [`gate`] | per-request access classification |
//! | [`jwt`] | signed, purpose-tagged claims |
//! | [`cache`] | cache trait and the in-memory implementation |
//! | `api` | axum router and extractors (feature `axum_api`) |

pub mod actions;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod events;
pub mod gate;
pub mod jwt;
pub mod messaging;
pub mod repository;
pub mod secret;
pub mod session;
pub mod tasks;
pub mod validators;
pub mod verification;

#[cfg(feature = "axum_api")]
pub mod api;

use std::fmt;

pub use cache::{Cache, CacheValue, InMemoryCache, user_cache_key, whatsapp_reset_key};
pub use config::{TokenConfig, VerigateConfig};
pub use crypto::{Argon2Hasher, PasswordHasher};
pub use events::{AuthEvent, register_event_listeners};
pub use gate::{AccessLevel, GateRejection, RequestContext};
pub use messaging::{Button, Mailer, Messenger, OutboundMessage};
pub use repository::{AuthUser, PasswordResetRepository, PasswordResetToken, UserRepository};
pub use secret::SecretString;
pub use session::{CookieSession, SessionManager, SessionStore, SessionValues};
use validators::ValidationError;
pub use verification::VerificationService;

#[cfg(any(test, feature = "mocks"))]
pub use messaging::{MockMailer, MockMessenger};
#[cfg(any(test, feature = "mocks"))]
pub use repository::{MockPasswordResetRepository, MockUserRepository};
#[cfg(any(test, feature = "mocks"))]
pub use session::MockSessionStore;

/// Reason a signed claim was refused.
///
/// Kept for logs only; remote parties always see the same generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtRejection {
    Malformed,
    BadSignature,
    Expired,
    WrongPurpose,
    PhoneMismatch,
}

impl fmt::Display for JwtRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Malformed => "malformed",
            Self::BadSignature => "bad_signature",
            Self::Expired => "expired",
            Self::WrongPurpose => "wrong_purpose",
            Self::PhoneMismatch => "phone_mismatch",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    NotAuthenticated,
    InvalidCredentials,
    UserNotFound,
    InvalidPasswordToken,
    Jwt(JwtRejection),
    InvalidVerificationCode,
    PhoneNumberMissing,
    VerificationRequired,
    Forbidden,
    Validation(ValidationError),
    PasswordHashError,
    DatabaseError(String),
    CacheError(String),
    SessionError(String),
    MessagingError(String),
    ConfigurationError(String),
}

/// Message shown to the remote party for every rejected link or code.
pub const GENERIC_VERIFICATION_FAILURE: &str = "This link is invalid or has expired.";

impl AuthError {
    /// True for failures whose cause must not be disclosed to the caller.
    pub fn is_generic_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::Jwt(_) | Self::InvalidVerificationCode | Self::InvalidPasswordToken
        )
    }
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "Not authenticated"),
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::UserNotFound => write!(f, "User not found"),
            Self::InvalidPasswordToken => {
                write!(f, "This password reset link is invalid or has expired")
            }
            Self::Jwt(_) | Self::InvalidVerificationCode => {
                write!(f, "{GENERIC_VERIFICATION_FAILURE}")
            }
            Self::PhoneNumberMissing => write!(f, "No phone number on this account"),
            Self::VerificationRequired => write!(f, "Phone verification required"),
            Self::Forbidden => write!(f, "Forbidden"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::PasswordHashError => write!(f, "Failed to hash password"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::CacheError(msg) => write!(f, "Cache error: {msg}"),
            Self::SessionError(msg) => write!(f, "Session error: {msg}"),
            Self::MessagingError(msg) => write!(f, "Messaging error: {msg}"),
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

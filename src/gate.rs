//! Per-request access classification.
//!
//! Every request is classified once into an [`AccessLevel`]; routes declare
//! the minimum level they need. Nothing is stored beyond the session and
//! the cached user record.

use std::fmt;

use crate::{AuthError, AuthUser};

/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    Anonymous,
    AuthenticatedUnverified,
    AuthenticatedVerified,
    Admin,
}

impl AccessLevel {
    /// Verification dominates role: an unverified admin is only
    /// `AuthenticatedUnverified`.
    pub fn classify(user: Option<&AuthUser>) -> Self {
        match user {
            None => Self::Anonymous,
            Some(user) if !user.is_verified() => Self::AuthenticatedUnverified,
            Some(user) if user.is_admin => Self::Admin,
            Some(_) => Self::AuthenticatedVerified,
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Anonymous => "anonymous",
            Self::AuthenticatedUnverified => "authenticated_unverified",
            Self::AuthenticatedVerified => "authenticated_verified",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// No session user. Answered with 401.
    NotAuthenticated,
    /// Signed in but phone not verified. Answered with a redirect to the
    /// verification notice.
    VerificationRequired,
    /// Verified but lacking the role.
    Forbidden,
}

impl From<GateRejection> for AuthError {
    fn from(rejection: GateRejection) -> Self {
        match rejection {
            GateRejection::NotAuthenticated => Self::NotAuthenticated,
            GateRejection::VerificationRequired => Self::VerificationRequired,
            GateRejection::Forbidden => Self::Forbidden,
        }
    }
}

/// Typed per-request context: the session user, if any, and its level.
#[derive(Debug, Clone)]
pub struct RequestContext {
    user: Option<AuthUser>,
    level: AccessLevel,
}

impl RequestContext {
    pub fn new(user: Option<AuthUser>) -> Self {
        let level = AccessLevel::classify(user.as_ref());
        Self { user, level }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn level(&self) -> AccessLevel {
        self.level
    }

    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    pub fn into_user(self) -> Option<AuthUser> {
        self.user
    }

    /// Admits the request if its level is at least `required`.
    pub fn require(&self, required: AccessLevel) -> Result<&AuthUser, GateRejection> {
        let Some(user) = self.user.as_ref() else {
            return Err(GateRejection::NotAuthenticated);
        };
        if self.level >= required {
            return Ok(user);
        }
        if self.level == AccessLevel::AuthenticatedUnverified {
            Err(GateRejection::VerificationRequired)
        } else {
            Err(GateRejection::Forbidden)
        }
    }
}

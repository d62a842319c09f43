use chrono::{DateTime, Utc};

/// Channel a password reset travelled through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetChannel {
    Email,
    Whatsapp,
}

impl ResetChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Whatsapp => "whatsapp",
        }
    }
}

/// Authentication events emitted by verigate actions and services.
///
/// Events are always fired. If no listeners are registered, they are
/// silently ignored. Register listeners via
/// [`register_event_listeners`](crate::register_event_listeners).
#[derive(Debug, Clone)]
pub enum AuthEvent {
    // session
    LoginSuccess {
        user_id: i64,
        at: DateTime<Utc>,
    },
    LoginFailed {
        identifier: String,
        reason: String,
        at: DateTime<Utc>,
    },
    LogoutSuccess {
        user_id: i64,
        at: DateTime<Utc>,
    },

    // password
    PasswordResetRequested {
        user_id: i64,
        channel: ResetChannel,
        at: DateTime<Utc>,
    },
    PasswordResetCompleted {
        user_id: i64,
        channel: ResetChannel,
        at: DateTime<Utc>,
    },

    // phone
    PhoneVerificationSent {
        user_id: i64,
        phone_number: String,
        at: DateTime<Utc>,
    },
    PhoneVerified {
        user_id: i64,
        at: DateTime<Utc>,
    },
    /// `reason` is for operators; the remote party only saw the generic message.
    PhoneVerificationFailed {
        phone_number: String,
        reason: String,
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// Returns a dot-separated event name for logging/tracing.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSuccess { .. } => "auth.login.success",
            Self::LoginFailed { .. } => "auth.login.failed",
            Self::LogoutSuccess { .. } => "auth.logout.success",
            Self::PasswordResetRequested { .. } => "auth.password.reset_requested",
            Self::PasswordResetCompleted { .. } => "auth.password.reset_completed",
            Self::PhoneVerificationSent { .. } => "auth.phone.verification_sent",
            Self::PhoneVerified { .. } => "auth.phone.verified",
            Self::PhoneVerificationFailed { .. } => "auth.phone.verification_failed",
        }
    }

    /// Returns the timestamp when this event occurred.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::LoginSuccess { at, .. }
            | Self::LoginFailed { at, .. }
            | Self::LogoutSuccess { at, .. }
            | Self::PasswordResetRequested { at, .. }
            | Self::PasswordResetCompleted { at, .. }
            | Self::PhoneVerificationSent { at, .. }
            | Self::PhoneVerified { at, .. }
            | Self::PhoneVerificationFailed { at, .. } => *at,
        }
    }
}

//! Outbound messaging collaborators.
//!
//! Transport (WhatsApp API, SMTP) is out of scope; these traits are the seam
//! the verification and reset flows send through.

#[cfg(any(test, feature = "mocks"))]
mod mock;

use async_trait::async_trait;

use crate::{AuthError, SecretString};

#[cfg(any(test, feature = "mocks"))]
pub use mock::{MockMailer, MockMessenger};

/// A reply button. `payload` comes back verbatim in the webhook when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub payload: String,
    pub title: String,
}

impl Button {
    pub fn new(payload: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            title: title.into(),
        }
    }
}

/// Anything the crate sent, as recorded by the mock collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Text {
        to: String,
        body: String,
    },
    Buttons {
        to: String,
        body: String,
        buttons: Vec<Button>,
    },
    PasswordResetEmail {
        to: String,
        link: SecretString,
    },
}

impl OutboundMessage {
    pub fn recipient(&self) -> &str {
        match self {
            Self::Text { to, .. } | Self::Buttons { to, .. } | Self::PasswordResetEmail { to, .. } => {
                to
            }
        }
    }
}

/// Chat channel (WhatsApp) used for the second factor.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), AuthError>;

    async fn send_buttons(&self, to: &str, body: &str, buttons: &[Button])
    -> Result<(), AuthError>;
}

/// Email channel for same-channel password resets.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// `link` embeds a plaintext reset token.
    async fn send_password_reset(&self, to: &str, link: &SecretString) -> Result<(), AuthError>;
}

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Button, Mailer, Messenger, OutboundMessage};
use crate::{AuthError, SecretString};

/// Records every message instead of sending it.
#[derive(Clone, Default)]
pub struct MockMessenger {
    pub sent: Arc<Mutex<Vec<OutboundMessage>>>,
    pub fail: Arc<AtomicBool>,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<OutboundMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    /// Buttons of the most recent button message.
    pub fn last_buttons(&self) -> Vec<Button> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|m| match m {
                OutboundMessage::Buttons { buttons, .. } => Some(buttons.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Body of the most recent plain text message.
    pub fn last_text(&self) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|m| match m {
            OutboundMessage::Text { body, .. } => Some(body.clone()),
            _ => None,
        })
    }

    fn record(&self, message: OutboundMessage) -> Result<(), AuthError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::MessagingError("messenger unavailable".to_owned()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), AuthError> {
        self.record(OutboundMessage::Text {
            to: to.to_owned(),
            body: body.to_owned(),
        })
    }

    async fn send_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[Button],
    ) -> Result<(), AuthError> {
        self.record(OutboundMessage::Buttons {
            to: to.to_owned(),
            body: body.to_owned(),
            buttons: buttons.to_vec(),
        })
    }
}

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent reset link, exposed for the test to follow.
    pub fn last_link(&self) -> Option<String> {
        self.sent.lock().unwrap().iter().rev().find_map(|m| match m {
            OutboundMessage::PasswordResetEmail { link, .. } => {
                Some(link.expose_secret().to_owned())
            }
            _ => None,
        })
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send_password_reset(&self, to: &str, link: &SecretString) -> Result<(), AuthError> {
        self.sent.lock().unwrap().push(OutboundMessage::PasswordResetEmail {
            to: to.to_owned(),
            link: link.clone(),
        });
        Ok(())
    }
}

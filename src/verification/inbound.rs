//! Dispatch of inbound WhatsApp webhook messages.

use serde::Deserialize;

use super::payload::{ButtonPayload, parse_new_password};
use super::service::VerificationService;
use crate::cache::Cache;
use crate::validators::normalize_phone_number;
use crate::{
    AuthError, GENERIC_VERIFICATION_FAILURE, Messenger, PasswordHasher, UserRepository,
};

const VERIFIED_REPLY: &str = "Your phone number is verified. You can return to the website.";
const PASSWORD_UPDATED_REPLY: &str = "Your password has been updated. You can now log in.";
const HELP_VERIFICATION_REPLY: &str = "Log in on the website and open the verification page to receive a new set of codes.";
const HELP_RESET_REPLY: &str =
    "Open \"Forgot password\" on the website and choose WhatsApp to receive a reset button here.";
const GET_STARTED_REPLY: &str =
    "Welcome! Create an account on the website and verify this number to get started.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InboundContent {
    /// Payload of a pressed reply button.
    Button(String),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InboundMessage {
    /// Sender phone number as reported by the provider.
    pub from: String,
    pub content: InboundContent,
}

/// What an inbound message led to. The sender has already been replied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    Verified { user_id: i64 },
    VerificationRejected,
    /// A legacy code-less verify button; a fresh challenge went out.
    ChallengeResent { user_id: i64 },
    ResetLinkSent,
    PasswordReset { user_id: i64 },
    ResetRejected,
    HelpSent,
    Ignored,
}

impl InboundOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Verified { .. } => "verified",
            Self::VerificationRejected => "verification_rejected",
            Self::ChallengeResent { .. } => "challenge_resent",
            Self::ResetLinkSent => "reset_link_sent",
            Self::PasswordReset { .. } => "password_reset",
            Self::ResetRejected => "reset_rejected",
            Self::HelpSent => "help_sent",
            Self::Ignored => "ignored",
        }
    }
}

impl<U, C, M, H> VerificationService<U, C, M, H>
where
    U: UserRepository,
    C: Cache,
    M: Messenger,
    H: PasswordHasher,
{
    /// Routes one webhook message and replies to the sender.
    ///
    /// Rejections reach the sender only as the generic failure message.
    /// Store and messaging errors are returned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "handle_inbound", skip_all, err)
    )]
    pub async fn handle_inbound(
        &self,
        message: &InboundMessage,
    ) -> Result<InboundOutcome, AuthError> {
        let from = normalize_phone_number(&message.from);
        if from.is_empty() {
            return Ok(InboundOutcome::Ignored);
        }

        match &message.content {
            InboundContent::Button(payload) => self.handle_button(&from, payload).await,
            InboundContent::Text(text) => self.handle_text(&from, text).await,
        }
    }

    async fn handle_button(&self, from: &str, payload: &str) -> Result<InboundOutcome, AuthError> {
        let Some(parsed) = ButtonPayload::parse(payload) else {
            log::debug!(target: "verigate::verification", "msg=\"unrecognised button payload\" len={}", payload.len());
            return Ok(InboundOutcome::Ignored);
        };

        match parsed {
            ButtonPayload::Verify {
                token,
                code: Some(code),
            } => match self.confirm_phone_verification(from, &token, &code).await {
                Ok(user) => {
                    self.messenger.send_text(from, VERIFIED_REPLY).await?;
                    Ok(InboundOutcome::Verified { user_id: user.id })
                }
                Err(e) if e.is_generic_verification_failure() => {
                    self.reply_generic(from).await?;
                    Ok(InboundOutcome::VerificationRejected)
                }
                Err(e) => Err(e),
            },
            ButtonPayload::Verify { token, code: None } => self.resend_for_legacy(from, &token).await,
            ButtonPayload::ResetPassword { token } => {
                match self.open_password_reset(from, &token).await {
                    Ok(_) => Ok(InboundOutcome::ResetLinkSent),
                    Err(e) if e.is_generic_verification_failure() => {
                        self.reply_generic(from).await?;
                        Ok(InboundOutcome::ResetRejected)
                    }
                    Err(e) => Err(e),
                }
            }
            ButtonPayload::HelpReset => self.reply_help(from, HELP_RESET_REPLY).await,
            ButtonPayload::HelpVerification => {
                self.reply_help(from, HELP_VERIFICATION_REPLY).await
            }
            ButtonPayload::LoginWeb => {
                let body = format!("Log in here: {}/login", self.app_base_url);
                self.reply_help(from, &body).await
            }
            ButtonPayload::GetStarted => self.reply_help(from, GET_STARTED_REPLY).await,
        }
    }

    /// Old challenge messages carried no code. The token still proves the
    /// number, so a fresh challenge is sent in place of verifying.
    async fn resend_for_legacy(&self, from: &str, token: &str) -> Result<InboundOutcome, AuthError> {
        if let Err(e) = self.jwt.validate_phone_verification(token, from) {
            self.record_failure(from, &e).await;
            self.reply_generic(from).await?;
            return Ok(InboundOutcome::VerificationRejected);
        }

        match self.user_repository.find_user_by_phone(from).await? {
            Some(user) if !user.is_verified() => {
                self.send_phone_verification(&user).await?;
                Ok(InboundOutcome::ChallengeResent { user_id: user.id })
            }
            Some(_) => {
                self.messenger.send_text(from, VERIFIED_REPLY).await?;
                Ok(InboundOutcome::HelpSent)
            }
            None => {
                self.reply_generic(from).await?;
                Ok(InboundOutcome::VerificationRejected)
            }
        }
    }

    async fn handle_text(&self, from: &str, text: &str) -> Result<InboundOutcome, AuthError> {
        let Some(password) = parse_new_password(text) else {
            return Ok(InboundOutcome::Ignored);
        };

        match self.reset_password_inline(from, &password).await {
            Ok(user) => {
                self.messenger.send_text(from, PASSWORD_UPDATED_REPLY).await?;
                Ok(InboundOutcome::PasswordReset { user_id: user.id })
            }
            Err(AuthError::Validation(e)) => {
                self.messenger.send_text(from, &e.to_string()).await?;
                Ok(InboundOutcome::ResetRejected)
            }
            Err(e) if e.is_generic_verification_failure() => {
                self.reply_generic(from).await?;
                Ok(InboundOutcome::ResetRejected)
            }
            Err(e) => Err(e),
        }
    }

    async fn reply_generic(&self, to: &str) -> Result<(), AuthError> {
        self.messenger.send_text(to, GENERIC_VERIFICATION_FAILURE).await
    }

    async fn reply_help(&self, to: &str, body: &str) -> Result<InboundOutcome, AuthError> {
        self.messenger.send_text(to, body).await?;
        Ok(InboundOutcome::HelpSent)
    }
}

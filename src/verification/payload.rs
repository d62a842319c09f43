//! Codec for WhatsApp button payloads and inline text commands.
//!
//! Payloads arrive from a third-party webhook and are untrusted. Parsing only
//! checks shape; every token still goes through signature validation.

use crate::SecretString;

/// Longest payload accepted before any splitting.
pub const MAX_PAYLOAD_LEN: usize = 4096;

const VERIFY_PREFIX: &str = "verify_";
const RESET_PREFIX: &str = "reset_password_";
const NEW_PASSWORD_PREFIX: &str = "NEW PASSWORD:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonPayload {
    /// `verify_<token>_<code>`, or the legacy `verify_<token>` with no code.
    Verify { token: String, code: Option<String> },
    /// `reset_password_<token>`
    ResetPassword { token: String },
    HelpReset,
    HelpVerification,
    LoginWeb,
    GetStarted,
}

impl ButtonPayload {
    pub fn parse(payload: &str) -> Option<Self> {
        if payload.len() > MAX_PAYLOAD_LEN || !payload.is_ascii() {
            return None;
        }

        match payload {
            "help_reset" => return Some(Self::HelpReset),
            "help_verification" => return Some(Self::HelpVerification),
            "login_web" => return Some(Self::LoginWeb),
            "get_started" => return Some(Self::GetStarted),
            _ => {}
        }

        if let Some(rest) = payload.strip_prefix(RESET_PREFIX) {
            return non_empty(rest).map(|token| Self::ResetPassword { token });
        }

        let rest = payload.strip_prefix(VERIFY_PREFIX)?;
        // base64url tokens may contain `_`, so only a trailing two-digit
        // segment is read as the code
        match rest.rsplit_once('_') {
            Some((token, code)) if is_code(code) && !token.is_empty() => Some(Self::Verify {
                token: token.to_owned(),
                code: Some(code.to_owned()),
            }),
            _ => non_empty(rest).map(|token| Self::Verify { token, code: None }),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Verify {
                token,
                code: Some(code),
            } => format!("{VERIFY_PREFIX}{token}_{code}"),
            Self::Verify { token, code: None } => format!("{VERIFY_PREFIX}{token}"),
            Self::ResetPassword { token } => format!("{RESET_PREFIX}{token}"),
            Self::HelpReset => "help_reset".to_owned(),
            Self::HelpVerification => "help_verification".to_owned(),
            Self::LoginWeb => "login_web".to_owned(),
            Self::GetStarted => "get_started".to_owned(),
        }
    }
}

fn is_code(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit())
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

/// Reads `NEW PASSWORD: <password>`; the prefix is case-insensitive and the
/// password is trimmed.
pub fn parse_new_password(text: &str) -> Option<SecretString> {
    let text = text.trim_start();
    let prefix = text.get(..NEW_PASSWORD_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(NEW_PASSWORD_PREFIX) {
        return None;
    }
    Some(SecretString::new(text[NEW_PASSWORD_PREFIX.len()..].trim()))
}

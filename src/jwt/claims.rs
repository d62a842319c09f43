use serde::{Deserialize, Serialize};

/// Purpose discriminator carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimPurpose {
    WhatsappPasswordReset,
}

/// Claims embedded in a verification or reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Expiration time (Unix seconds).
    pub exp: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<ClaimPurpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
}

impl VerificationClaims {
    pub fn phone_verification(phone_number: impl Into<String>, exp: i64) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            exp,
            purpose: None,
            user_id: None,
        }
    }

    pub fn whatsapp_password_reset(
        user_id: i64,
        phone_number: impl Into<String>,
        exp: i64,
    ) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
            exp,
            purpose: Some(ClaimPurpose::WhatsappPasswordReset),
            user_id: Some(user_id),
        }
    }
}

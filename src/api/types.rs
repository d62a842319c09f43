use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AuthError, AuthUser, SecretString};

// Request DTOs

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address or phone number.
    pub identifier: String,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub user_id: i64,
    pub token_id: i64,
    pub token: SecretString,
    pub password: SecretString,
}

#[derive(Debug, Deserialize)]
pub struct WhatsappForgotPasswordRequest {
    pub phone_number: String,
}

#[derive(Debug, Deserialize)]
pub struct WhatsappResetPasswordRequest {
    pub token: SecretString,
    pub password: SecretString,
}

// Response DTOs

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    pub verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct VerificationNoticeResponse {
    pub verified: bool,
    pub phone_number: Option<String>,
    /// The code to tap on the chat channel, while one is outstanding.
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub outcome: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<AuthUser> for UserResponse {
    fn from(user: AuthUser) -> Self {
        UserResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            phone_number: user.phone_number,
            verified: user.verified,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        let code = match &err {
            AuthError::NotAuthenticated => "NOT_AUTHENTICATED",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::InvalidPasswordToken
            | AuthError::Jwt(_)
            | AuthError::InvalidVerificationCode => "INVALID_OR_EXPIRED",
            AuthError::PhoneNumberMissing => "PHONE_NUMBER_MISSING",
            AuthError::VerificationRequired => "VERIFICATION_REQUIRED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::PasswordHashError => "PASSWORD_HASH_ERROR",
            AuthError::DatabaseError(_) => "DATABASE_ERROR",
            AuthError::CacheError(_) => "CACHE_ERROR",
            AuthError::SessionError(_) => "SESSION_ERROR",
            AuthError::MessagingError(_) => "MESSAGING_ERROR",
            AuthError::ConfigurationError(_) => "CONFIGURATION_ERROR",
        };

        ErrorResponse {
            error: err.to_string(),
            code: code.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JwtRejection;

    #[test]
    fn test_verification_failures_share_one_code() {
        let codes: Vec<String> = [
            AuthError::Jwt(JwtRejection::Expired),
            AuthError::Jwt(JwtRejection::BadSignature),
            AuthError::InvalidVerificationCode,
            AuthError::InvalidPasswordToken,
        ]
        .into_iter()
        .map(|e| ErrorResponse::from(e).code)
        .collect();

        assert!(codes.iter().all(|c| c == "INVALID_OR_EXPIRED"));
    }

    #[test]
    fn test_user_response_hides_secrets() {
        let user = AuthUser::mock().with_hashed_password("$argon2id$secret");
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"verified\":false"));
    }
}

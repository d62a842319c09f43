use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};

use crate::AuthError;
use crate::api::ErrorResponse;

/// Where unverified users are sent when a route needs verification.
pub const VERIFICATION_NOTICE_PATH: &str = "/verification-notice";

/// converts `AuthError` into appropriate HTTP responses
#[derive(Debug)]
pub struct AppError(pub AuthError);

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthError::VerificationRequired => {
                return Redirect::to(VERIFICATION_NOTICE_PATH).into_response();
            }
            AuthError::NotAuthenticated | AuthError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::InvalidPasswordToken
            | AuthError::Jwt(_)
            | AuthError::InvalidVerificationCode
            | AuthError::PhoneNumberMissing
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::UserNotFound
            | AuthError::PasswordHashError
            | AuthError::DatabaseError(_)
            | AuthError::CacheError(_)
            | AuthError::SessionError(_)
            | AuthError::MessagingError(_)
            | AuthError::ConfigurationError(_) => {
                log::error!(target: "verigate", "msg=\"request failed\" error=\"{}\"", self.0);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

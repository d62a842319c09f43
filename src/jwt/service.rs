use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::{ClaimPurpose, JwtConfig, VerificationClaims};
use crate::{AuthError, JwtRejection};

/// Issues and validates verification and reset claims.
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let encoding_key = EncodingKey::from_secret(secret);
        let decoding_key = DecodingKey::from_secret(secret);

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Signs a phone-verification claim for `phone_number`.
    pub fn issue_phone_verification(&self, phone_number: &str) -> Result<String, AuthError> {
        let exp = Utc::now() + self.config.phone_verification_expiry();
        self.encode(&VerificationClaims::phone_verification(
            phone_number,
            exp.timestamp(),
        ))
    }

    /// Signs a WhatsApp password-reset claim bound to both user and phone.
    pub fn issue_whatsapp_password_reset(
        &self,
        user_id: i64,
        phone_number: &str,
    ) -> Result<String, AuthError> {
        let exp = Utc::now() + self.config.password_reset_expiry();
        self.encode(&VerificationClaims::whatsapp_password_reset(
            user_id,
            phone_number,
            exp.timestamp(),
        ))
    }

    pub fn encode(&self, claims: &VerificationClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|_| AuthError::ConfigurationError("failed to sign claims".to_owned()))
    }

    /// Checks signature and expiry only. Callers almost always want one of the
    /// purpose-specific validators instead.
    pub fn decode(&self, token: &str) -> Result<VerificationClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<VerificationClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                let rejection = match e.kind() {
                    ErrorKind::ExpiredSignature => JwtRejection::Expired,
                    ErrorKind::InvalidSignature => JwtRejection::BadSignature,
                    _ => JwtRejection::Malformed,
                };
                AuthError::Jwt(rejection)
            })
    }

    /// Accepts only an untyped phone-verification claim whose phone number
    /// equals `sender_phone`.
    pub fn validate_phone_verification(
        &self,
        token: &str,
        sender_phone: &str,
    ) -> Result<VerificationClaims, AuthError> {
        let claims = self.decode(token)?;

        if claims.purpose.is_some() {
            return Err(AuthError::Jwt(JwtRejection::WrongPurpose));
        }
        ensure_phone_matches(&claims, sender_phone)?;

        Ok(claims)
    }

    /// Accepts only a `whatsapp_password_reset` claim that names a user.
    ///
    /// `sender_phone` is `None` on the web form, where there is no second
    /// channel to compare against; the caller then checks the claim's phone
    /// against the stored user instead.
    pub fn validate_whatsapp_password_reset(
        &self,
        token: &str,
        sender_phone: Option<&str>,
    ) -> Result<VerificationClaims, AuthError> {
        let claims = self.decode(token)?;

        if claims.purpose != Some(ClaimPurpose::WhatsappPasswordReset) || claims.user_id.is_none()
        {
            return Err(AuthError::Jwt(JwtRejection::WrongPurpose));
        }
        if let Some(sender_phone) = sender_phone {
            ensure_phone_matches(&claims, sender_phone)?;
        }

        Ok(claims)
    }
}

fn ensure_phone_matches(claims: &VerificationClaims, sender_phone: &str) -> Result<(), AuthError> {
    match claims.phone_number.as_deref() {
        Some(phone) if phone == sender_phone => Ok(()),
        _ => Err(AuthError::Jwt(JwtRejection::PhoneMismatch)),
    }
}

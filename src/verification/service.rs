use chrono::{Duration, Utc};
use rand::rngs::OsRng;

use super::challenge::{build_challenge, generate_code};
use super::payload::ButtonPayload;
use crate::cache::{Cache, CacheValue, user_cache_key, whatsapp_reset_key};
use crate::crypto::constant_time_eq;
use crate::events::{AuthEvent, ResetChannel, dispatch};
use crate::jwt::JwtService;
use crate::validators::{PasswordPolicy, normalize_phone_number, validate_phone_number};
use crate::{
    AuthError, AuthUser, Button, JwtRejection, Messenger, PasswordHasher, SecretString,
    UserRepository,
};

pub(super) const CHALLENGE_PROMPT: &str =
    "Tap the code shown on the website to verify your phone number.";
pub(super) const RESET_PROMPT: &str =
    "We received a request to reset your password. Tap below to continue.";

/// Two-channel phone verification and WhatsApp password reset.
///
/// No challenge state is stored server side: each button carries a signed
/// token and a code, and both are checked again when the button comes back.
pub struct VerificationService<U, C, M, H>
where
    U: UserRepository,
    C: Cache,
    M: Messenger,
    H: PasswordHasher,
{
    pub(super) user_repository: U,
    pub(super) cache: C,
    pub(super) messenger: M,
    pub(super) jwt: JwtService,
    pub(super) hasher: H,
    pub(super) policy: PasswordPolicy,
    pub(super) app_base_url: String,
}

impl<U, C, M, H> VerificationService<U, C, M, H>
where
    U: UserRepository,
    C: Cache,
    M: Messenger,
    H: PasswordHasher,
{
    pub fn new(
        user_repository: U,
        cache: C,
        messenger: M,
        jwt: JwtService,
        hasher: H,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            user_repository,
            cache,
            messenger,
            jwt,
            hasher,
            policy: PasswordPolicy::default(),
            app_base_url: app_base_url.into(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: PasswordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Stores a fresh code for `user` and sends the three-button challenge to
    /// their phone. Any earlier code stops working.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "send_phone_verification", skip_all, fields(user_id = user.id), err)
    )]
    pub async fn send_phone_verification(&self, user: &AuthUser) -> Result<(), AuthError> {
        let phone = user
            .phone_number
            .as_deref()
            .map(normalize_phone_number)
            .ok_or(AuthError::PhoneNumberMissing)?;

        let token = self.jwt.issue_phone_verification(&phone)?;
        let (code, codes) = {
            let mut rng = OsRng;
            let code = generate_code(&mut rng);
            let codes = build_challenge(&code, &mut rng);
            (code, codes)
        };

        self.user_repository
            .set_verification_code(user.id, &code)
            .await?;
        self.cache.delete(&user_cache_key(user.id)).await?;

        let buttons: Vec<Button> = codes
            .into_iter()
            .map(|c| {
                let payload = ButtonPayload::Verify {
                    token: token.clone(),
                    code: Some(c.clone()),
                };
                Button::new(payload.encode(), c)
            })
            .collect();

        self.messenger
            .send_buttons(&phone, CHALLENGE_PROMPT, &buttons)
            .await?;

        dispatch(AuthEvent::PhoneVerificationSent {
            user_id: user.id,
            phone_number: phone,
            at: Utc::now(),
        })
        .await;

        log::info!(target: "verigate::verification", "msg=\"verification challenge sent\" user_id={}", user.id);

        Ok(())
    }

    /// Checks a pressed challenge button.
    ///
    /// The token must be a phone-verification claim for `sender_phone`, and
    /// `code` must equal the stored code of the user owning that phone. On
    /// success the user is verified and the code cleared, so the same button
    /// cannot be used twice.
    ///
    /// # Returns
    ///
    /// - `Ok(user)` - the now verified user
    /// - `Err(AuthError::Jwt(_))` or `Err(AuthError::InvalidVerificationCode)` -
    ///   generic failure; the user is left unchanged
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "confirm_phone_verification", skip_all, err)
    )]
    pub async fn confirm_phone_verification(
        &self,
        sender_phone: &str,
        token: &str,
        code: &str,
    ) -> Result<AuthUser, AuthError> {
        match self.check_challenge(sender_phone, token, code).await {
            Ok(mut user) => {
                self.user_repository.mark_verified(user.id).await?;
                self.cache.delete(&user_cache_key(user.id)).await?;
                user.verified = true;
                user.verification_code = None;

                dispatch(AuthEvent::PhoneVerified {
                    user_id: user.id,
                    at: Utc::now(),
                })
                .await;
                log::info!(target: "verigate::verification", "msg=\"phone verified\" user_id={}", user.id);

                Ok(user)
            }
            Err(e) => {
                if e.is_generic_verification_failure() {
                    self.record_failure(sender_phone, &e).await;
                }
                Err(e)
            }
        }
    }

    async fn check_challenge(
        &self,
        sender_phone: &str,
        token: &str,
        code: &str,
    ) -> Result<AuthUser, AuthError> {
        let claims = self.jwt.validate_phone_verification(token, sender_phone)?;
        let phone = claims
            .phone_number
            .as_deref()
            .ok_or(AuthError::InvalidVerificationCode)?;

        let user = self
            .user_repository
            .find_user_by_phone(phone)
            .await?
            .ok_or(AuthError::InvalidVerificationCode)?;

        match user.verification_code.as_deref() {
            Some(stored) if constant_time_eq(stored.as_bytes(), code.as_bytes()) => Ok(user),
            _ => Err(AuthError::InvalidVerificationCode),
        }
    }

    /// Sends a reset button to a verified user's phone.
    ///
    /// Returns `Ok(false)`, sending nothing, when no verified user owns the
    /// number. Callers answer the same either way.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "request_whatsapp_password_reset", skip_all, err)
    )]
    pub async fn request_password_reset(&self, phone_number: &str) -> Result<bool, AuthError> {
        let phone = normalize_phone_number(phone_number);
        validate_phone_number(&phone)?;

        let user = match self.user_repository.find_user_by_phone(&phone).await? {
            Some(user) if user.is_verified() => user,
            _ => {
                log::debug!(target: "verigate::verification", "msg=\"whatsapp reset for unknown or unverified phone\"");
                return Ok(false);
            }
        };

        let token = self.jwt.issue_whatsapp_password_reset(user.id, &phone)?;
        let button = Button::new(
            ButtonPayload::ResetPassword { token }.encode(),
            "Reset password",
        );
        self.messenger.send_buttons(&phone, RESET_PROMPT, &[button]).await?;

        dispatch(AuthEvent::PasswordResetRequested {
            user_id: user.id,
            channel: ResetChannel::Whatsapp,
            at: Utc::now(),
        })
        .await;
        log::info!(target: "verigate::verification", "msg=\"whatsapp reset sent\" user_id={}", user.id);

        Ok(true)
    }

    /// Handles a pressed reset button: opens a reset grant for the sender and
    /// replies with the web form link and the inline alternative.
    ///
    /// The grant lives under [`whatsapp_reset_key`] for the rest of the
    /// claim's lifetime. Only a sender holding one may reset inline.
    pub async fn open_password_reset(
        &self,
        sender_phone: &str,
        token: &str,
    ) -> Result<String, AuthError> {
        let claims = match self
            .jwt
            .validate_whatsapp_password_reset(token, Some(sender_phone))
        {
            Ok(claims) => claims,
            Err(e) => {
                self.record_failure(sender_phone, &e).await;
                return Err(e);
            }
        };
        let user_id = claims.user_id.ok_or(AuthError::Jwt(JwtRejection::WrongPurpose))?;

        let ttl = Duration::seconds(claims.exp - Utc::now().timestamp());
        self.cache
            .set(&whatsapp_reset_key(sender_phone), CacheValue::ResetGrant(user_id), ttl)
            .await?;

        let link = format!("{}/reset-password/whatsapp?token={token}", self.app_base_url);
        let body = format!(
            "Choose a new password here: {link}\n\nOr reply with NEW PASSWORD: followed by your new password."
        );
        self.messenger.send_text(sender_phone, &body).await?;

        Ok(link)
    }

    /// Sets a new password sent as an inline message.
    ///
    /// The sender must hold an open reset grant naming the verified user that
    /// owns `sender_phone`. The grant is consumed once the password is set; a
    /// password refused by the policy leaves it open for another try.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "reset_password_inline", skip_all, err)
    )]
    pub async fn reset_password_inline(
        &self,
        sender_phone: &str,
        new_password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        let key = whatsapp_reset_key(sender_phone);
        let granted = match self.cache.get(&key).await? {
            Some(value) => Some(value.into_reset_grant()?),
            None => None,
        };

        let user = match self.user_repository.find_user_by_phone(sender_phone).await? {
            Some(user) if user.is_verified() && granted == Some(user.id) => user,
            _ => {
                let e = AuthError::InvalidVerificationCode;
                self.record_failure(sender_phone, &e).await;
                return Err(e);
            }
        };

        self.set_password(&user, new_password).await?;
        self.cache.delete(&key).await?;
        Ok(user)
    }

    /// Redeems a WhatsApp reset token from the web form.
    ///
    /// The token must carry the reset purpose and name a user whose phone
    /// still matches the one in the claim.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "complete_whatsapp_password_reset", skip_all, err)
    )]
    pub async fn complete_password_reset(
        &self,
        token: &str,
        new_password: &SecretString,
    ) -> Result<AuthUser, AuthError> {
        let claims = self.jwt.validate_whatsapp_password_reset(token, None)?;
        let user_id = claims.user_id.ok_or(AuthError::Jwt(JwtRejection::WrongPurpose))?;

        let user = self
            .user_repository
            .find_user_by_id(user_id)
            .await?
            .filter(|u| u.phone_number.is_some() && u.phone_number == claims.phone_number)
            .ok_or(AuthError::Jwt(JwtRejection::PhoneMismatch))?;

        self.set_password(&user, new_password).await?;
        if let Some(phone) = user.phone_number.as_deref() {
            self.cache.delete(&whatsapp_reset_key(phone)).await?;
        }
        Ok(user)
    }

    async fn set_password(
        &self,
        user: &AuthUser,
        new_password: &SecretString,
    ) -> Result<(), AuthError> {
        self.policy.validate(new_password.expose_secret())?;

        let hashed = self.hasher.hash(new_password.expose_secret())?;
        self.user_repository.update_password(user.id, &hashed).await?;
        self.cache.delete(&user_cache_key(user.id)).await?;

        dispatch(AuthEvent::PasswordResetCompleted {
            user_id: user.id,
            channel: ResetChannel::Whatsapp,
            at: Utc::now(),
        })
        .await;
        log::info!(target: "verigate::verification", "msg=\"password reset\" user_id={} channel=whatsapp", user.id);

        Ok(())
    }

    pub(super) async fn record_failure(&self, sender_phone: &str, error: &AuthError) {
        let reason = match error {
            AuthError::Jwt(rejection) => rejection.to_string(),
            AuthError::InvalidVerificationCode => "code_mismatch".to_owned(),
            other => format!("{other:?}"),
        };

        log::info!(target: "verigate::verification", "msg=\"verification rejected\" reason={reason}");
        dispatch(AuthEvent::PhoneVerificationFailed {
            phone_number: sender_phone.to_owned(),
            reason,
            at: Utc::now(),
        })
        .await;
    }
}

#[cfg(test)]
pub(super) mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::crypto::Argon2Hasher;
    use crate::jwt::{JwtConfig, VerificationClaims};
    use crate::messaging::OutboundMessage;
    use crate::{JwtRejection, MockMessenger, MockUserRepository};

    pub const PHONE: &str = "+15550109999";

    pub type TestService =
        VerificationService<MockUserRepository, InMemoryCache, MockMessenger, Argon2Hasher>;

    pub struct Fixture {
        pub users: MockUserRepository,
        pub cache: InMemoryCache,
        pub messenger: MockMessenger,
        pub jwt: JwtService,
        pub service: TestService,
    }

    pub fn fixture(user: AuthUser) -> Fixture {
        let users = MockUserRepository::with_users([user]);
        let cache = InMemoryCache::new();
        let messenger = MockMessenger::new();
        let jwt = JwtService::new(JwtConfig::new("verification-secret-32-bytes-long").unwrap());
        let service = VerificationService::new(
            users.clone(),
            cache.clone(),
            messenger.clone(),
            jwt.clone(),
            Argon2Hasher::new(1024, 1, 1),
            "https://app.example.com",
        );
        Fixture {
            users,
            cache,
            messenger,
            jwt,
            service,
        }
    }

    fn verify_payload(button: &Button) -> (String, String) {
        match ButtonPayload::parse(&button.payload).unwrap() {
            ButtonPayload::Verify {
                token,
                code: Some(code),
            } => (token, code),
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_challenge() {
        let fx = fixture(AuthUser::mock().with_id(5));
        fx.cache
            .set("user:5", CacheValue::User(AuthUser::mock()), chrono::Duration::minutes(5))
            .await
            .unwrap();

        fx.service
            .send_phone_verification(&fx.users.get(5).unwrap())
            .await
            .unwrap();

        let stored = fx.users.get(5).unwrap().verification_code.unwrap();
        let buttons = fx.messenger.last_buttons();
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons.iter().filter(|b| b.title == stored).count(), 1);
        for button in &buttons {
            let (token, code) = verify_payload(button);
            assert_eq!(code, button.title);
            assert!(fx.jwt.validate_phone_verification(&token, PHONE).is_ok());
        }
        assert!(!fx.cache.contains("user:5"));
        assert_eq!(fx.messenger.last().unwrap().recipient(), PHONE);
    }

    #[tokio::test]
    async fn test_send_without_phone() {
        let fx = fixture(AuthUser::mock().with_phone(None));
        let user = fx.users.get(1).unwrap();
        assert_eq!(
            fx.service.send_phone_verification(&user).await.unwrap_err(),
            AuthError::PhoneNumberMissing
        );
        assert!(fx.messenger.messages().is_empty());
    }

    #[tokio::test]
    async fn test_pick_correct_code() {
        let fx = fixture(AuthUser::mock());
        fx.service
            .send_phone_verification(&fx.users.get(1).unwrap())
            .await
            .unwrap();

        let stored = fx.users.get(1).unwrap().verification_code.unwrap();
        let right = fx
            .messenger
            .last_buttons()
            .into_iter()
            .find(|b| b.title == stored)
            .unwrap();
        let (token, code) = verify_payload(&right);

        let user = fx
            .service
            .confirm_phone_verification(PHONE, &token, &code)
            .await
            .unwrap();
        assert!(user.verified);

        let row = fx.users.get(1).unwrap();
        assert!(row.verified);
        assert!(row.verification_code.is_none());

        // replaying the same button fails once the code is cleared
        assert_eq!(
            fx.service
                .confirm_phone_verification(PHONE, &token, &code)
                .await
                .unwrap_err(),
            AuthError::InvalidVerificationCode
        );
    }

    #[tokio::test]
    async fn test_challenge_for_formatted_phone() {
        let fx = fixture(AuthUser::mock().with_phone(Some("+1 (555) 010-9999")));
        fx.service
            .send_phone_verification(&fx.users.get(1).unwrap())
            .await
            .unwrap();
        assert_eq!(fx.messenger.last().unwrap().recipient(), PHONE);

        let stored = fx.users.get(1).unwrap().verification_code.unwrap();
        let right = fx
            .messenger
            .last_buttons()
            .into_iter()
            .find(|b| b.title == stored)
            .unwrap();
        let (token, _) = verify_payload(&right);
        let claims = fx.jwt.validate_phone_verification(&token, PHONE).unwrap();
        assert_eq!(claims.phone_number.as_deref(), Some(PHONE));
    }

    #[tokio::test]
    async fn test_pick_decoy() {
        let fx = fixture(AuthUser::mock());
        fx.service
            .send_phone_verification(&fx.users.get(1).unwrap())
            .await
            .unwrap();

        let stored = fx.users.get(1).unwrap().verification_code.unwrap();
        let decoy = fx
            .messenger
            .last_buttons()
            .into_iter()
            .find(|b| b.title != stored)
            .unwrap();
        let (token, code) = verify_payload(&decoy);

        let err = fx
            .service
            .confirm_phone_verification(PHONE, &token, &code)
            .await
            .unwrap_err();
        assert!(err.is_generic_verification_failure());

        let row = fx.users.get(1).unwrap();
        assert!(!row.verified);
        assert_eq!(row.verification_code, Some(stored));
    }

    #[tokio::test]
    async fn test_other_sender_rejected() {
        let fx = fixture(AuthUser::mock());
        fx.users.set_verification_code(1, "37").await.unwrap();
        let token = fx.jwt.issue_phone_verification(PHONE).unwrap();

        assert_eq!(
            fx.service
                .confirm_phone_verification("+15550100000", &token, "37")
                .await
                .unwrap_err(),
            AuthError::Jwt(JwtRejection::PhoneMismatch)
        );
        assert!(!fx.users.get(1).unwrap().verified);
    }

    #[tokio::test]
    async fn test_reset_token_cannot_verify() {
        let fx = fixture(AuthUser::mock());
        fx.users.set_verification_code(1, "37").await.unwrap();
        let token = fx.jwt.issue_whatsapp_password_reset(1, PHONE).unwrap();

        assert_eq!(
            fx.service
                .confirm_phone_verification(PHONE, &token, "37")
                .await
                .unwrap_err(),
            AuthError::Jwt(JwtRejection::WrongPurpose)
        );
    }

    #[tokio::test]
    async fn test_request_reset_needs_verified_owner() {
        let fx = fixture(AuthUser::mock());
        assert!(!fx.service.request_password_reset(PHONE).await.unwrap());
        assert!(fx.messenger.messages().is_empty());

        fx.users.mark_verified(1).await.unwrap();
        assert!(fx.service.request_password_reset("+1 555 010 9999").await.unwrap());

        let button = &fx.messenger.last_buttons()[0];
        let Some(ButtonPayload::ResetPassword { token }) = ButtonPayload::parse(&button.payload)
        else {
            panic!("expected reset payload");
        };
        let claims = fx.jwt.validate_whatsapp_password_reset(&token, Some(PHONE)).unwrap();
        assert_eq!(claims.user_id, Some(1));
    }

    #[tokio::test]
    async fn test_open_reset_replies_with_link() {
        let fx = fixture(AuthUser::mock().verified());
        let token = fx.jwt.issue_whatsapp_password_reset(1, PHONE).unwrap();

        let link = fx.service.open_password_reset(PHONE, &token).await.unwrap();
        assert!(link.starts_with("https://app.example.com/reset-password/whatsapp?token="));
        match fx.messenger.last().unwrap() {
            OutboundMessage::Text { body, .. } => assert!(body.contains(&link)),
            other => panic!("unexpected {other:?}"),
        }

        let grant = fx.cache.get("whatsapp_reset:+15550109999").await.unwrap();
        assert_eq!(grant, Some(CacheValue::ResetGrant(1)));
    }

    #[tokio::test]
    async fn test_rejected_reset_button_opens_no_grant() {
        let fx = fixture(AuthUser::mock().verified());
        let token = fx.jwt.issue_phone_verification(PHONE).unwrap();

        assert!(fx.service.open_password_reset(PHONE, &token).await.is_err());
        assert!(!fx.cache.contains("whatsapp_reset:+15550109999"));
    }

    #[tokio::test]
    async fn test_reset_claim_without_type_rejected() {
        let fx = fixture(AuthUser::mock().verified());
        let exp = (Utc::now() + chrono::Duration::hours(1)).timestamp();
        let mut claims = VerificationClaims::whatsapp_password_reset(1, PHONE, exp);
        claims.purpose = None;
        let token = fx.jwt.encode(&claims).unwrap();

        assert_eq!(
            fx.service
                .complete_password_reset(&token, &"new-password-1".into())
                .await
                .unwrap_err(),
            AuthError::Jwt(JwtRejection::WrongPurpose)
        );
        assert!(fx.service.open_password_reset(PHONE, &token).await.is_err());
    }

    #[tokio::test]
    async fn test_complete_reset_on_web() {
        let fx = fixture(AuthUser::mock().verified());
        let token = fx.jwt.issue_whatsapp_password_reset(1, PHONE).unwrap();

        fx.service
            .complete_password_reset(&token, &"new-password-1".into())
            .await
            .unwrap();

        let hash = fx.users.get(1).unwrap().hashed_password;
        assert!(Argon2Hasher::default().verify("new-password-1", &hash).unwrap());
    }

    #[tokio::test]
    async fn test_complete_reset_after_phone_change() {
        let fx = fixture(AuthUser::mock().verified());
        let token = fx.jwt.issue_whatsapp_password_reset(1, PHONE).unwrap();
        fx.users.users.lock().unwrap()[0].phone_number = Some("+15550100000".to_owned());

        assert_eq!(
            fx.service
                .complete_password_reset(&token, &"new-password-1".into())
                .await
                .unwrap_err(),
            AuthError::Jwt(JwtRejection::PhoneMismatch)
        );
    }

    #[tokio::test]
    async fn test_inline_reset() {
        let fx = fixture(AuthUser::mock().verified());
        let token = fx.jwt.issue_whatsapp_password_reset(1, PHONE).unwrap();
        fx.service.open_password_reset(PHONE, &token).await.unwrap();

        let err = fx
            .service
            .reset_password_inline(PHONE, &"short".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert!(fx.cache.contains("whatsapp_reset:+15550109999"));

        fx.service
            .reset_password_inline(PHONE, &"long-enough-1".into())
            .await
            .unwrap();
        let hash = fx.users.get(1).unwrap().hashed_password;
        assert!(Argon2Hasher::default().verify("long-enough-1", &hash).unwrap());

        // the grant is spent
        assert!(!fx.cache.contains("whatsapp_reset:+15550109999"));
        assert_eq!(
            fx.service
                .reset_password_inline(PHONE, &"long-enough-2".into())
                .await
                .unwrap_err(),
            AuthError::InvalidVerificationCode
        );
    }

    #[tokio::test]
    async fn test_inline_reset_without_grant() {
        let fx = fixture(AuthUser::mock().verified());
        let before = fx.users.get(1).unwrap().hashed_password;

        assert_eq!(
            fx.service
                .reset_password_inline(PHONE, &"long-enough-1".into())
                .await
                .unwrap_err(),
            AuthError::InvalidVerificationCode
        );
        assert_eq!(fx.users.get(1).unwrap().hashed_password, before);
    }

    #[tokio::test]
    async fn test_inline_reset_grant_for_other_user() {
        let fx = fixture(AuthUser::mock().verified());
        fx.cache
            .set(
                "whatsapp_reset:+15550109999",
                CacheValue::ResetGrant(2),
                chrono::Duration::minutes(5),
            )
            .await
            .unwrap();

        assert_eq!(
            fx.service
                .reset_password_inline(PHONE, &"long-enough-1".into())
                .await
                .unwrap_err(),
            AuthError::InvalidVerificationCode
        );
    }

    #[tokio::test]
    async fn test_inline_reset_unverified() {
        let fx = fixture(AuthUser::mock());
        fx.cache
            .set(
                "whatsapp_reset:+15550109999",
                CacheValue::ResetGrant(1),
                chrono::Duration::minutes(5),
            )
            .await
            .unwrap();

        assert_eq!(
            fx.service
                .reset_password_inline(PHONE, &"long-enough-1".into())
                .await
                .unwrap_err(),
            AuthError::InvalidVerificationCode
        );
    }

    #[tokio::test]
    async fn test_web_reset_spends_grant() {
        let fx = fixture(AuthUser::mock().verified());
        let token = fx.jwt.issue_whatsapp_password_reset(1, PHONE).unwrap();
        fx.service.open_password_reset(PHONE, &token).await.unwrap();

        fx.service
            .complete_password_reset(&token, &"new-password-1".into())
            .await
            .unwrap();
        assert!(!fx.cache.contains("whatsapp_reset:+15550109999"));
    }
}

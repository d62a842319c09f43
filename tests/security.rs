//! Security properties of the reset, verification and session flows.
//!
//! Run with: `cargo test --features mocks --test security`

#![cfg(feature = "mocks")]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header};
use verigate::actions::{GetAuthenticatedUserAction, ResetTokenService};
use verigate::jwt::{JwtConfig, JwtService, VerificationClaims};
use verigate::verification::payload::ButtonPayload;
use verigate::verification::{InboundContent, InboundMessage, InboundOutcome};
use verigate::{
    Argon2Hasher, AuthError, AuthUser, Cache, CacheValue, InMemoryCache, JwtRejection,
    MockMessenger, MockPasswordResetRepository, MockSessionStore, MockUserRepository,
    SecretString, SessionManager, UserRepository, VerificationService, user_cache_key,
};

const PHONE: &str = "+15550109999";
const JWT_SECRET: &str = "security-jwt-secret-32-bytes-long!";

fn hasher() -> Argon2Hasher {
    Argon2Hasher::new(1024, 1, 1)
}

fn jwt() -> JwtService {
    JwtService::new(JwtConfig::new(JWT_SECRET).unwrap())
}

fn reset_tokens(
    repo: &MockPasswordResetRepository,
) -> ResetTokenService<MockPasswordResetRepository, Argon2Hasher> {
    ResetTokenService::new(repo.clone(), hasher(), 32, Duration::hours(1))
}

fn verification(
    users: &MockUserRepository,
    messenger: &MockMessenger,
) -> VerificationService<MockUserRepository, InMemoryCache, MockMessenger, Argon2Hasher> {
    VerificationService::new(
        users.clone(),
        InMemoryCache::new(),
        messenger.clone(),
        jwt(),
        hasher(),
        "https://app.test",
    )
}

fn press(payload: ButtonPayload) -> InboundMessage {
    InboundMessage {
        from: PHONE.to_owned(),
        content: InboundContent::Button(payload.encode()),
    }
}

// reset tokens

#[tokio::test]
async fn test_reset_token_wrong_suffix_is_generic_failure() {
    let repo = MockPasswordResetRepository::new();
    let service = reset_tokens(&repo);
    let issued = service
        .store(1, SecretString::new("ab12cd34"))
        .await
        .unwrap();

    let result = service
        .validate(1, issued.token_id, &SecretString::new("ab12cd99"))
        .await;
    assert_eq!(result, Err(AuthError::InvalidPasswordToken));

    assert!(
        service
            .validate(1, issued.token_id, &SecretString::new("ab12cd34"))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_reset_token_bound_to_user() {
    let repo = MockPasswordResetRepository::new();
    let service = reset_tokens(&repo);
    let issued = service.issue(1).await.unwrap();

    let result = service.validate(2, issued.token_id, &issued.token).await;
    assert_eq!(result, Err(AuthError::InvalidPasswordToken));
}

#[tokio::test]
async fn test_expired_reset_token_looks_like_mismatch() {
    let repo = MockPasswordResetRepository::new();
    let service = reset_tokens(&repo);
    let issued = service.issue(1).await.unwrap();
    repo.backdate(issued.token_id, Utc::now() - Duration::hours(2));

    let result = service.validate(1, issued.token_id, &issued.token).await;
    assert_eq!(result, Err(AuthError::InvalidPasswordToken));
}

#[tokio::test]
async fn test_reset_tokens_stored_hashed() {
    let repo = MockPasswordResetRepository::new();
    let issued = reset_tokens(&repo).issue(1).await.unwrap();

    let rows = repo.tokens.lock().unwrap().clone();
    assert_eq!(rows.len(), 1);
    assert_ne!(rows[0].token_hash, issued.token.expose_secret());
    assert!(rows[0].token_hash.starts_with("$argon2"));
}

// verification challenge

#[tokio::test]
async fn test_decoy_code_rejected_correct_code_accepted() {
    let users = MockUserRepository::with_users([AuthUser::mock()]);
    users.set_verification_code(1, "37").await.unwrap();
    let messenger = MockMessenger::new();
    let service = verification(&users, &messenger);
    let token = jwt().issue_phone_verification(PHONE).unwrap();

    let outcome = service
        .handle_inbound(&press(ButtonPayload::Verify {
            token: token.clone(),
            code: Some("52".to_owned()),
        }))
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::VerificationRejected);
    assert!(!users.get(1).unwrap().verified);
    assert_eq!(
        messenger.last_text().unwrap(),
        "This link is invalid or has expired."
    );

    let outcome = service
        .handle_inbound(&press(ButtonPayload::Verify {
            token,
            code: Some("37".to_owned()),
        }))
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::Verified { user_id: 1 });

    let user = users.get(1).unwrap();
    assert!(user.verified);
    assert!(user.verification_code.is_none());
}

#[tokio::test]
async fn test_token_for_another_phone_rejected() {
    let users = MockUserRepository::with_users([AuthUser::mock()]);
    users.set_verification_code(1, "37").await.unwrap();
    let messenger = MockMessenger::new();
    let token = jwt().issue_phone_verification("+15550100000").unwrap();

    let result = verification(&users, &messenger)
        .confirm_phone_verification(PHONE, &token, "37")
        .await;
    assert_eq!(result.unwrap_err(), AuthError::Jwt(JwtRejection::PhoneMismatch));
    assert!(!users.get(1).unwrap().verified);
}

#[tokio::test]
async fn test_token_signed_with_other_key_rejected() {
    let users = MockUserRepository::with_users([AuthUser::mock()]);
    users.set_verification_code(1, "37").await.unwrap();
    let messenger = MockMessenger::new();
    let forged = JwtService::new(JwtConfig::new("an-entirely-different-secret-32-bytes").unwrap())
        .issue_phone_verification(PHONE)
        .unwrap();

    let result = verification(&users, &messenger)
        .confirm_phone_verification(PHONE, &forged, "37")
        .await;
    assert_eq!(result.unwrap_err(), AuthError::Jwt(JwtRejection::BadSignature));
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let expired = jwt()
        .encode(&VerificationClaims::phone_verification(
            PHONE,
            (Utc::now() - Duration::minutes(1)).timestamp(),
        ))
        .unwrap();

    assert_eq!(
        jwt().validate_phone_verification(&expired, PHONE).unwrap_err(),
        AuthError::Jwt(JwtRejection::Expired)
    );
}

// claim purpose

#[test]
fn test_reset_claim_without_type_rejected() {
    let untyped = jwt()
        .encode(&VerificationClaims {
            phone_number: Some(PHONE.to_owned()),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            purpose: None,
            user_id: Some(1),
        })
        .unwrap();

    assert_eq!(
        jwt()
            .validate_whatsapp_password_reset(&untyped, Some(PHONE))
            .unwrap_err(),
        AuthError::Jwt(JwtRejection::WrongPurpose)
    );
}

#[test]
fn test_reset_claim_with_altered_type_rejected() {
    let claims = serde_json::json!({
        "phone_number": PHONE,
        "exp": (Utc::now() + Duration::hours(1)).timestamp(),
        "type": "admin_password_reset",
        "user_id": 1,
    });
    let token = jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let err = jwt()
        .validate_whatsapp_password_reset(&token, Some(PHONE))
        .unwrap_err();
    assert!(err.is_generic_verification_failure());
}

#[test]
fn test_purposes_do_not_cross() {
    let reset = jwt().issue_whatsapp_password_reset(1, PHONE).unwrap();
    assert_eq!(
        jwt().validate_phone_verification(&reset, PHONE).unwrap_err(),
        AuthError::Jwt(JwtRejection::WrongPurpose)
    );

    let verify = jwt().issue_phone_verification(PHONE).unwrap();
    assert_eq!(
        jwt()
            .validate_whatsapp_password_reset(&verify, Some(PHONE))
            .unwrap_err(),
        AuthError::Jwt(JwtRejection::WrongPurpose)
    );
}

#[tokio::test]
async fn test_reset_after_phone_change_rejected() {
    let users = MockUserRepository::with_users([AuthUser::mock().verified()]);
    let messenger = MockMessenger::new();
    let token = jwt().issue_whatsapp_password_reset(1, PHONE).unwrap();

    let mut moved = users.get(1).unwrap();
    moved.phone_number = Some("+15550100000".to_owned());
    users.remove(1);
    users.insert(moved);

    let result = verification(&users, &messenger)
        .complete_password_reset(&token, &SecretString::new("a-brand-new-password"))
        .await;
    assert_eq!(result.unwrap_err(), AuthError::Jwt(JwtRejection::PhoneMismatch));
}

#[tokio::test]
async fn test_inline_password_needs_open_reset() {
    let users = MockUserRepository::with_users([AuthUser::mock().verified()]);
    let messenger = MockMessenger::new();
    let service = verification(&users, &messenger);
    let before = users.get(1).unwrap().hashed_password;

    let outcome = service
        .handle_inbound(&InboundMessage {
            from: PHONE.to_owned(),
            content: InboundContent::Text("NEW PASSWORD: taken-over-account".to_owned()),
        })
        .await
        .unwrap();
    assert_eq!(outcome, InboundOutcome::ResetRejected);
    assert_eq!(users.get(1).unwrap().hashed_password, before);
}

// sessions and the user cache

#[tokio::test]
async fn test_login_leaves_no_stale_cache_entry() {
    let users = MockUserRepository::with_users([AuthUser::mock().with_id(42)]);
    let cache = InMemoryCache::new();
    cache
        .set(
            &user_cache_key(42),
            CacheValue::User(AuthUser::mock().with_id(42).with_email("old@example.com")),
            Duration::minutes(30),
        )
        .await
        .unwrap();

    let sessions = SessionManager::new(MockSessionStore::new(), cache.clone());
    sessions.login(42).await.unwrap();
    assert!(!cache.contains("user:42"));

    let user = GetAuthenticatedUserAction::new(users, cache.clone(), Duration::minutes(30))
        .execute(&sessions)
        .await
        .unwrap();
    assert_eq!(user.email, "test@example.com");
    assert!(cache.contains("user:42"));
}

#[derive(Clone)]
struct UnavailableCache;

#[async_trait]
impl Cache for UnavailableCache {
    async fn get(&self, _key: &str) -> Result<Option<CacheValue>, AuthError> {
        Err(AuthError::CacheError("connection refused".to_owned()))
    }

    async fn set(&self, _key: &str, _value: CacheValue, _ttl: Duration) -> Result<(), AuthError> {
        Err(AuthError::CacheError("connection refused".to_owned()))
    }

    async fn delete(&self, _key: &str) -> Result<(), AuthError> {
        Err(AuthError::CacheError("connection refused".to_owned()))
    }
}

#[tokio::test]
async fn test_logout_never_fails() {
    let store = MockSessionStore::logged_in(42);
    store.set_fail_reads(true);
    store.set_fail_writes(true);
    let sessions = SessionManager::new(store, UnavailableCache);

    // nothing to invalidate when the session cannot be read
    assert!(sessions.logout().await.is_none());

    let sessions = SessionManager::new(MockSessionStore::logged_in(42), UnavailableCache);
    let task = sessions.logout().await.unwrap();
    task.join().await;
    assert!(sessions.store().was_destroyed());
}

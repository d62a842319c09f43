use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// A user row as the auth core sees it.
///
/// The password hash and the pending verification code are never
/// serialized, so a cached copy carries neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing)]
    pub hashed_password: String,
    pub verified: bool,
    pub is_admin: bool,
    #[serde(default, skip_serializing)]
    pub verification_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AuthUser {
    pub fn is_verified(&self) -> bool {
        self.verified
    }

    /// Admin rights only count once the phone is verified.
    pub fn is_verified_admin(&self) -> bool {
        self.verified && self.is_admin
    }
}

#[cfg(any(test, feature = "mocks"))]
impl AuthUser {
    pub fn mock() -> Self {
        let now = Utc::now();
        AuthUser {
            id: 1,
            email: "test@example.com".to_owned(),
            name: "Test User".to_owned(),
            phone_number: Some("+15550109999".to_owned()),
            hashed_password: "fakehashedpassword".to_owned(),
            verified: false,
            is_admin: false,
            verification_code: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: &str) -> Self {
        email.clone_into(&mut self.email);
        self
    }

    #[must_use]
    pub fn with_phone(mut self, phone_number: Option<&str>) -> Self {
        self.phone_number = phone_number.map(ToOwned::to_owned);
        self
    }

    #[must_use]
    pub fn with_hashed_password(mut self, hashed_password: &str) -> Self {
        hashed_password.clone_into(&mut self.hashed_password);
        self
    }

    #[must_use]
    pub fn verified(mut self) -> Self {
        self.verified = true;
        self
    }

    #[must_use]
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }
}

/// User store.
///
/// Every mutator here changes the row only; invalidating the `user:<id>`
/// cache entry is the caller's job.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<AuthUser>, AuthError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;

    /// `phone_number` is normalised; uniqueness is enforced by the store.
    async fn find_user_by_phone(&self, phone_number: &str)
    -> Result<Option<AuthUser>, AuthError>;

    async fn update_password(&self, user_id: i64, hashed_password: &str) -> Result<(), AuthError>;

    /// Overwrites any pending code.
    async fn set_verification_code(&self, user_id: i64, code: &str) -> Result<(), AuthError>;

    /// Sets `verified` and clears the pending code in one write.
    async fn mark_verified(&self, user_id: i64) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_secrets() {
        let mut user = AuthUser::mock().with_hashed_password("$argon2id$...");
        user.verification_code = Some("37".to_owned());

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("hashed_password").is_none());
        assert!(json.get("verification_code").is_none());

        let restored: AuthUser = serde_json::from_value(json).unwrap();
        assert_eq!(restored.hashed_password, "");
        assert_eq!(restored.verification_code, None);
        assert_eq!(restored.email, user.email);
    }

    #[test]
    fn test_admin_requires_verification() {
        assert!(!AuthUser::mock().admin().is_verified_admin());
        assert!(AuthUser::mock().admin().verified().is_verified_admin());
        assert!(!AuthUser::mock().verified().is_verified_admin());
    }
}

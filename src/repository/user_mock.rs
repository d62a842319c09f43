#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::AuthError;

use super::user::{AuthUser, UserRepository};

#[derive(Clone, Default)]
pub struct MockUserRepository {
    pub users: Arc<Mutex<Vec<AuthUser>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = AuthUser>) -> Self {
        Self {
            users: Arc::new(Mutex::new(users.into_iter().collect())),
        }
    }

    pub fn insert(&self, user: AuthUser) {
        self.users.lock().unwrap().push(user);
    }

    pub fn remove(&self, user_id: i64) {
        self.users.lock().unwrap().retain(|u| u.id != user_id);
    }

    /// Snapshot of a row, bypassing the trait.
    pub fn get(&self, user_id: i64) -> Option<AuthUser> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
    }

    fn modify<F>(&self, user_id: i64, f: F) -> Result<(), AuthError>
    where
        F: FnOnce(&mut AuthUser),
    {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;
        f(user);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<AuthUser>, AuthError> {
        Ok(self.get(id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_phone(
        &self,
        phone_number: &str,
    ) -> Result<Option<AuthUser>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .find(|u| u.phone_number.as_deref() == Some(phone_number))
            .cloned())
    }

    async fn update_password(&self, user_id: i64, hashed_password: &str) -> Result<(), AuthError> {
        self.modify(user_id, |user| {
            hashed_password.clone_into(&mut user.hashed_password);
        })
    }

    async fn set_verification_code(&self, user_id: i64, code: &str) -> Result<(), AuthError> {
        self.modify(user_id, |user| {
            user.verification_code = Some(code.to_owned());
        })
    }

    async fn mark_verified(&self, user_id: i64) -> Result<(), AuthError> {
        self.modify(user_id, |user| {
            user.verified = true;
            user.verification_code = None;
        })
    }
}

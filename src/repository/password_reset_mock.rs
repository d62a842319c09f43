#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::AuthError;

use super::password_reset::{PasswordResetRepository, PasswordResetToken};

#[derive(Clone, Default)]
pub struct MockPasswordResetRepository {
    pub tokens: Arc<Mutex<Vec<PasswordResetToken>>>,
    next_id: Arc<AtomicI64>,
}

impl MockPasswordResetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves a token's creation time, to simulate it ageing.
    pub fn backdate(&self, id: i64, created_at: DateTime<Utc>) {
        let mut tokens = self.tokens.lock().unwrap();
        if let Some(token) = tokens.iter_mut().find(|t| t.id == id) {
            token.created_at = created_at;
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PasswordResetRepository for MockPasswordResetRepository {
    async fn create_reset_token(
        &self,
        user_id: i64,
        token_hash: &str,
    ) -> Result<PasswordResetToken, AuthError> {
        let token = PasswordResetToken {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            token_hash: token_hash.to_owned(),
            created_at: Utc::now(),
        };

        self.tokens.lock().unwrap().push(token.clone());
        Ok(token)
    }

    async fn find_reset_token(
        &self,
        id: i64,
        user_id: i64,
        not_before: DateTime<Utc>,
    ) -> Result<Option<PasswordResetToken>, AuthError> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens
            .iter()
            .find(|t| t.id == id && t.user_id == user_id && t.created_at >= not_before)
            .cloned())
    }

    async fn delete_user_reset_tokens(&self, user_id: i64) -> Result<u64, AuthError> {
        let mut tokens = self.tokens.lock().unwrap();
        let before = tokens.len();
        tokens.retain(|t| t.user_id != user_id);
        Ok(u64::try_from(before - tokens.len()).unwrap_or(u64::MAX))
    }
}

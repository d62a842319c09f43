use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::cookie::verify_signed_cookie;
use crate::{AuthError, SecretString};

/// The only values a session carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionValues {
    pub authenticated: bool,
    pub user_id: Option<i64>,
}

impl SessionValues {
    pub fn logged_in(user_id: i64) -> Self {
        Self {
            authenticated: true,
            user_id: Some(user_id),
        }
    }

    /// The user id, if and only if the session is authenticated.
    pub fn authenticated_user_id(&self) -> Option<i64> {
        if self.authenticated { self.user_id } else { None }
    }
}

/// Per-request session storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<SessionValues, AuthError>;

    async fn save(&self, values: &SessionValues) -> Result<(), AuthError>;

    /// Clears every value and expires the session on the client.
    async fn destroy(&self) -> Result<(), AuthError>;
}

/// What the response should do with the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookieAction {
    #[default]
    Unchanged,
    Set,
    Remove,
}

#[derive(Debug, Default)]
struct CookieState {
    values: SessionValues,
    action: CookieAction,
}

/// Session held in a signed cookie for the lifetime of one request.
///
/// The HTTP layer builds one from the request cookie, hands clones to the
/// handler, then reads [`CookieSession::pending`] to write the response
/// cookie.
#[derive(Debug, Clone, Default)]
pub struct CookieSession {
    state: Arc<Mutex<CookieState>>,
}

impl CookieSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: SessionValues) -> Self {
        Self {
            state: Arc::new(Mutex::new(CookieState {
                values,
                action: CookieAction::Unchanged,
            })),
        }
    }

    /// A missing or tampered cookie yields an empty session.
    pub fn from_cookie(cookie_value: Option<&str>, secret: &SecretString) -> Self {
        let values = cookie_value
            .and_then(|value| verify_signed_cookie(value, secret))
            .unwrap_or_default();
        Self::with_values(values)
    }

    pub fn pending(&self) -> Result<(CookieAction, SessionValues), AuthError> {
        let state = self.lock()?;
        Ok((state.action, state.values))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, CookieState>, AuthError> {
        self.state
            .lock()
            .map_err(|_| AuthError::SessionError("session lock poisoned".to_owned()))
    }
}

#[async_trait]
impl SessionStore for CookieSession {
    async fn load(&self) -> Result<SessionValues, AuthError> {
        Ok(self.lock()?.values)
    }

    async fn save(&self, values: &SessionValues) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        state.values = *values;
        state.action = CookieAction::Set;
        Ok(())
    }

    async fn destroy(&self) -> Result<(), AuthError> {
        let mut state = self.lock()?;
        state.values = SessionValues::default();
        state.action = CookieAction::Remove;
        Ok(())
    }
}

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{SessionStore, SessionValues};
use crate::AuthError;

/// In-memory session that can be told to fail.
///
/// With `fail_writes` set, `save` and `destroy` still change the in-memory
/// values but report a backend error, as a store that lost its connection
/// mid-write would.
#[derive(Clone, Default)]
pub struct MockSessionStore {
    pub values: Arc<Mutex<SessionValues>>,
    pub fail_reads: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
    pub destroyed: Arc<AtomicBool>,
}

impl MockSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_in(user_id: i64) -> Self {
        let store = Self::default();
        *store.values.lock().unwrap() = SessionValues::logged_in(user_id);
        store
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> SessionValues {
        *self.values.lock().unwrap()
    }

    pub fn was_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn write_result(&self) -> Result<(), AuthError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(AuthError::SessionError("session backend unavailable".to_owned()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionStore for MockSessionStore {
    async fn load(&self) -> Result<SessionValues, AuthError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AuthError::SessionError("session backend unavailable".to_owned()));
        }
        Ok(self.snapshot())
    }

    async fn save(&self, values: &SessionValues) -> Result<(), AuthError> {
        *self.values.lock().unwrap() = *values;
        self.write_result()
    }

    async fn destroy(&self) -> Result<(), AuthError> {
        *self.values.lock().unwrap() = SessionValues::default();
        self.destroyed.store(true, Ordering::SeqCst);
        self.write_result()
    }
}

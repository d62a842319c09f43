//! Cookie-backed sessions and login/logout.
//!
//! A session holds exactly two values, `authenticated` and `user_id`, signed
//! into the cookie with HMAC-SHA256. [`SessionManager`] is the only writer.

mod config;
mod cookie;
mod manager;
mod store;

#[cfg(any(test, feature = "mocks"))]
mod mock;

pub use config::{SameSite, SessionConfig};
pub use cookie::{
    find_cookie, removal_cookie_header, session_cookie_header, sign_session_values,
    verify_signed_cookie,
};
pub use manager::SessionManager;
pub use store::{CookieAction, CookieSession, SessionStore, SessionValues};

#[cfg(any(test, feature = "mocks"))]
pub use mock::MockSessionStore;

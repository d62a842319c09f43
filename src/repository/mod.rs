//! Repository traits and data types.
//!
//! Storage is kept behind these traits so the auth core never names a
//! database. Implement them for your own backend.
//!
//! # Traits
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`UserRepository`] | User lookup by id, email or phone; password and verification updates |
//! | [`PasswordResetRepository`] | Hashed password reset tokens |
//!
//! # Data Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`AuthUser`] | User account data |
//! | [`PasswordResetToken`] | Stored password reset token |
//!
//! # Mock Implementations
//!
//! Enable the `mocks` feature for in-memory implementations useful for testing:
//!
//! - [`MockUserRepository`]
//! - [`MockPasswordResetRepository`]

mod password_reset;
mod user;

#[cfg(any(test, feature = "mocks"))]
mod password_reset_mock;
#[cfg(any(test, feature = "mocks"))]
mod user_mock;

pub use password_reset::PasswordResetRepository;
pub use password_reset::PasswordResetToken;
pub use user::AuthUser;
pub use user::UserRepository;

#[cfg(any(test, feature = "mocks"))]
pub use password_reset_mock::MockPasswordResetRepository;
#[cfg(any(test, feature = "mocks"))]
pub use user_mock::MockUserRepository;

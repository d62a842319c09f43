//! Business operations, each generic over the storage traits it needs.
//!
//! | Action | Purpose |
//! |--------|---------|
//! | [`GetAuthenticatedUserAction`] | cache-aside lookup of the session's user |
//! | [`LoginAction`] | email or phone plus password, then session login |
//! | [`ResetTokenService`] | issue, validate and revoke hashed reset tokens |
//! | [`ForgotPasswordAction`] | email a reset link |
//! | [`ResetPasswordAction`] | redeem a reset link |

mod current_user;
mod forgot_password;
mod login;
mod reset_password;
mod reset_token;

pub use current_user::GetAuthenticatedUserAction;
pub use forgot_password::ForgotPasswordAction;
pub use login::LoginAction;
pub use reset_password::ResetPasswordAction;
pub use reset_token::{IssuedResetToken, ResetTokenService};

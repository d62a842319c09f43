//! Signed, time-limited claims for the WhatsApp channel.
//!
//! Tokens are HS256 JWTs signed with the application key. A claim's `type`
//! field is its purpose discriminator: phone-verification tokens carry none,
//! WhatsApp password-reset tokens carry `"whatsapp_password_reset"`, and each
//! validator refuses the other's tokens.
//!
//! ```ignore
//! use verigate::jwt::{JwtConfig, JwtService};
//!
//! let service = JwtService::new(JwtConfig::new(secret)?);
//! let token = service.issue_phone_verification("+15550109999")?;
//! let claims = service.validate_phone_verification(&token, "+15550109999")?;
//! ```

mod claims;
mod config;
mod service;

pub use claims::{ClaimPurpose, VerificationClaims};
pub use config::{JwtConfig, MIN_SECRET_LENGTH};
pub use service::JwtService;

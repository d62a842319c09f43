//! Phone verification and WhatsApp password reset.
//!
//! Both flows issue a signed, short-lived claim, present buttons on the chat
//! channel, and check the claim again when a button comes back through the
//! webhook:
//!
//! - verification: `verify_<token>_<code>` buttons, one holding the user's
//!   stored two-digit code and two holding decoys, in random order
//! - reset: a `reset_password_<token>` button, followed by the web form or an
//!   inline `NEW PASSWORD: ...` reply

pub mod challenge;
mod inbound;
pub mod payload;
mod service;

pub use inbound::{InboundContent, InboundMessage, InboundOutcome};
pub use payload::ButtonPayload;
pub use service::VerificationService;

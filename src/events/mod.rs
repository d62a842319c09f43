//! In-process authentication events.
//!
//! Actions and the verification service fire an [`AuthEvent`] after each
//! login, logout, reset and phone verification. Nothing is persisted; with
//! no listeners registered, dispatch is a no-op.
//!
//! ```rust,ignore
//! use verigate::register_event_listeners;
//! use verigate::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```
//!
//! Implement [`Listener`] to forward events elsewhere:
//!
//! ```rust,ignore
//! use verigate::events::{AuthEvent, Listener};
//! use async_trait::async_trait;
//!
//! struct FailedVerificationCounter;
//!
//! #[async_trait]
//! impl Listener for FailedVerificationCounter {
//!     async fn handle(&self, event: &AuthEvent) {
//!         if let AuthEvent::PhoneVerificationFailed { reason, .. } = event {
//!             // bump a metric keyed by reason
//!         }
//!     }
//! }
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::{AuthEvent, ResetChannel};
pub use listener::Listener;
pub use registry::{EventRegistry, dispatch, register_event_listeners};

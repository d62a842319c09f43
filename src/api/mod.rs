//! HTTP surface.
//!
//! The axum router wires the session cookie, the per-request
//! [`RequestContext`](crate::RequestContext) and the verification webhook
//! onto the actions in this crate.

mod types;

pub use types::*;

pub mod axum;

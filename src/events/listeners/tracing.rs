use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Emits events as `tracing` events. Requires the `tracing` feature.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &AuthEvent) {
        match event {
            AuthEvent::LoginFailed { .. } | AuthEvent::PhoneVerificationFailed { .. } => {
                tracing::warn!(target: "verigate::events", event_name = event.name(), ?event, "auth event");
            }
            _ => {
                tracing::info!(target: "verigate::events", event_name = event.name(), ?event, "auth event");
            }
        }
    }
}

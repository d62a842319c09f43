use async_trait::async_trait;

use super::AuthEvent;

/// Receives every dispatched [`AuthEvent`].
///
/// Listeners run inline with the action that fired the event, in
/// registration order, so slow work should be handed off.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &AuthEvent);
}

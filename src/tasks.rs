//! Detached background work.
//!
//! A detached task runs on the tokio runtime with its own timeout, outside
//! the scope of the request that started it. Nobody awaits its result:
//! failures and timeouts are logged at `warn` and otherwise dropped. If the
//! process exits first the work is lost.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::AuthError;

/// Handle to a detached task. Dropping it does not cancel the task.
#[derive(Debug)]
pub struct DetachedTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl DetachedTask {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Waits for the task to finish. Only tests and shutdown hooks need this.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            log::warn!(target: "verigate", "msg=\"detached task panicked\" task={} error=\"{e}\"", self.name);
        }
    }
}

/// Runs `work` in the background, bounded by `timeout`.
///
/// Returns `None` when called outside a tokio runtime; the work is then
/// skipped and logged.
pub fn spawn_detached<F>(name: &'static str, timeout: Duration, work: F) -> Option<DetachedTask>
where
    F: Future<Output = Result<(), AuthError>> + Send + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        log::warn!(target: "verigate", "msg=\"no runtime for detached task\" task={name}");
        return None;
    };

    let handle = runtime.spawn(async move {
        match tokio::time::timeout(timeout, work).await {
            Ok(Ok(())) => {
                log::debug!(target: "verigate", "msg=\"detached task done\" task={name}");
            }
            Ok(Err(e)) => {
                log::warn!(target: "verigate", "msg=\"detached task failed\" task={name} error=\"{e}\"");
            }
            Err(_) => {
                log::warn!(target: "verigate", "msg=\"detached task timed out\" task={name} timeout_ms={}", timeout.as_millis());
            }
        }
    });

    Some(DetachedTask { name, handle })
}

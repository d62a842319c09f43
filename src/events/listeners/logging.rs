use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Logs every event through the `log` facade under `verigate::events`.
///
/// Failures are logged one level above successes.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }

    fn level_for(&self, event: &AuthEvent) -> log::Level {
        match event {
            AuthEvent::LoginFailed { .. } | AuthEvent::PhoneVerificationFailed { .. } => {
                match self.level {
                    log::Level::Trace => log::Level::Debug,
                    log::Level::Debug => log::Level::Info,
                    _ => log::Level::Warn,
                }
            }
            _ => self.level,
        }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &AuthEvent) {
        log::log!(
            target: "verigate::events",
            self.level_for(event),
            "event={} at={} {:?}",
            event.name(),
            event.timestamp().to_rfc3339(),
            event
        );
    }
}

//! Injected logging for command handlers.

/// Sink for verbose diagnostics that must not reach the chat.
pub trait CommandLog: Send + Sync {
    fn verbose(&self, message: &str);
}

/// Forwards to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl CommandLog for TracingLog {
    fn verbose(&self, message: &str) {
        tracing::debug!(target: "cronview::commands", "{message}");
    }
}

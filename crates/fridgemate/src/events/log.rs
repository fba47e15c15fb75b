use fridgemate_core::events::EventEmitter;

/// Emitter that records every message as an `info` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmitter;

impl EventEmitter for LogEmitter {
    fn publish(&self, topic: &str, message: &str) {
        tracing::info!(topic, message, "Audit event");
    }
}

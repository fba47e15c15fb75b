//! Fire-and-forget audit events.

/// Sink for audit messages about record mutations.
///
/// Publishing never blocks the caller and never fails: implementations hand
/// the message off and swallow any delivery error. Nothing in the record
/// lifecycle depends on a message arriving.
pub trait EventEmitter: Send + Sync {
    fn publish(&self, topic: &str, message: &str);
}

/// Returns the topic audit messages about `kind` are published on.
pub fn topic(kind: &str) -> String {
    format!("{}-topic", kind)
}

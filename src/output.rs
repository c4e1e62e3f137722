//! Notice reporting for cassette lifecycle events
//!
//! Everything the manager and comparator have to say goes through a
//! [`NoticeSink`], so silent mode is a sink swap rather than an `if` in
//! front of every print.

use colored::*;
use std::sync::{Mutex, PoisonError};

/// Fire-and-forget destination for human-readable notices
pub trait NoticeSink {
    fn notice(&self, message: &str);
}

impl<T: NoticeSink + ?Sized> NoticeSink for std::sync::Arc<T> {
    fn notice(&self, message: &str) {
        (**self).notice(message);
    }
}

/// Prints notices to stdout with a colored tag
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl NoticeSink for ConsoleSink {
    fn notice(&self, message: &str) {
        println!("{} {}", "Cassettes:".cyan(), message);
    }
}

/// Discards every notice (silent mode)
#[derive(Debug, Default)]
pub struct SilentSink;

impl NoticeSink for SilentSink {
    fn notice(&self, _message: &str) {}
}

/// Collects notices in memory for later inspection
///
/// Useful when embedding the manager in a harness that wants to assert on
/// what would have been printed.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notices received so far, in order
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NoticeSink for MemorySink {
    fn notice(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_in_order() {
        let sink = MemorySink::new();
        sink.notice("first");
        sink.notice("second");

        assert_eq!(sink.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_silent_sink_accepts_notices() {
        // No output and no state; just must not panic
        SilentSink.notice("ignored");
    }
}

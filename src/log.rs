//! Diagnostic sink for non-fatal problems
//!
//! Attribute and state validation never aborts a render. Problems are
//! reported through a [`LogSink`] so hosts can route them wherever they like.

use std::cell::RefCell;

pub trait LogSink {
    fn log_error(&self, message: &str);
}

/// Default sink: forwards every message to `tracing` at warn level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log_error(&self, message: &str) {
        tracing::warn!(target: "tagged_ssr::validation", "{}", message);
    }
}

/// Discards everything; used when development checks are off
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl LogSink for SilentSink {
    fn log_error(&self, _message: &str) {}
}

/// Keeps messages in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl LogSink for RecordingSink {
    fn log_error(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

/// The sink validation should report to: `sink` in dev mode, silence otherwise
pub(crate) fn gate(dev: bool, sink: &dyn LogSink) -> &dyn LogSink {
    if dev {
        sink
    } else {
        &SilentSink
    }
}

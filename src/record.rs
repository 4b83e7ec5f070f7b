use crate::severity::Severity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single log event as handed to the Telegram handler.
///
/// `formatted` is the pre-rendered line that ends up in the chat message;
/// `message` is kept for sinks that want the bare text. `context` is a
/// `BTreeMap` so that its serialization has a stable key order.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Severity,
    pub target: String,
    pub message: String,
    pub formatted: String,
    pub context: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Build a record whose rendered line is the message itself.
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        let message = message.into();
        LogRecord {
            timestamp: Utc::now(),
            level,
            target: String::new(),
            formatted: message.clone(),
            message,
            context: BTreeMap::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_formatted(mut self, formatted: impl Into<String>) -> Self {
        self.formatted = formatted.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Render the `<target>.<LEVEL>: <message>` line used by the layer.
pub fn render_line(target: &str, level: Severity, message: &str) -> String {
    format!("{}.{}: {}", target, level.name(), message)
}

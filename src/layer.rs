use crate::record::{render_line, LogRecord};
use crate::severity::Severity;
use crate::sink::LogSink;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets whose events are never forwarded: this crate and the HTTP
/// stack underneath it. Forwarding them would turn every delivery into
/// another delivery.
const IGNORED_TARGETS: &[&str] = &[env!("CARGO_CRATE_NAME"), "reqwest", "hyper", "hyper_util", "h2", "rustls"];

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands each one to a [`LogSink`].
///
/// Every accepted event spawns exactly one `write` on the current Tokio
/// runtime. There is no queue, batching or retry; if no runtime is
/// running the event is dropped and reported on stderr.
///
/// By default only `ERROR` events are accepted. A string field named
/// `severity` overrides the level, which is how `NOTICE`, `CRITICAL`,
/// `ALERT` and `EMERGENCY` records are produced:
///
/// ```ignore
/// tracing::error!(severity = "critical", db = "orders", "primary is down");
/// ```
pub struct TelegramLayer {
    sink: Arc<dyn LogSink>,
    min_level: Level,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events handed to the sink.
    pub dispatched_events: Arc<AtomicU64>,
    /// Accepted events that could not be handed to the sink.
    pub dropped_events: Arc<AtomicU64>,
}

impl TelegramLayer {
    pub fn new(sink: Arc<dyn LogSink>, min_level: Level) -> Self {
        Self {
            sink,
            min_level,
            total_events: Arc::new(AtomicU64::new(0)),
            dispatched_events: Arc::new(AtomicU64::new(0)),
            dropped_events: Arc::new(AtomicU64::new(0)),
        }
    }

    fn dispatch(&self, record: LogRecord) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("no tokio runtime, dropping log record");
                return;
            }
        };

        self.dispatched_events.fetch_add(1, Ordering::Relaxed);
        let sink = Arc::clone(&self.sink);
        handle.spawn(async move {
            if let Err(e) = sink.write(&record).await {
                eprintln!("error writing log record: {}", e);
            }
        });
    }
}

fn is_ignored(target: &str) -> bool {
    IGNORED_TARGETS.iter().any(|prefix| {
        target
            .strip_prefix(prefix)
            .map_or(false, |rest| rest.is_empty() || rest.starts_with("::"))
    })
}

impl<S> Layer<S> for TelegramLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let meta = event.metadata();
        if *meta.level() > self.min_level || is_ignored(meta.target()) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let level = match visitor.severity.as_deref().map(str::parse::<Severity>) {
            None => Severity::from(*meta.level()),
            Some(Ok(level)) => level,
            Some(Err(e)) => {
                self.dropped_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("{}, dropping log record", e);
                return;
            }
        };

        let message = visitor.message.unwrap_or_default();
        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            target: meta.target().to_string(),
            formatted: render_line(meta.target(), level, &message),
            message,
            context: visitor.fields,
        };

        self.dispatch(record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    fields: BTreeMap<String, serde_json::Value>,
    message: Option<String>,
    severity: Option<String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "severity" => self.severity = Some(value.to_string()),
            name => {
                self.fields.insert(name.to_string(), serde_json::Value::String(value.to_string()));
            }
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // Format-string messages arrive here as `fmt::Arguments`.
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            name => {
                self.fields.insert(name.to_string(), serde_json::Value::String(format!("{:?}", value)));
            }
        }
    }
}

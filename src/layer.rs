use crate::logger::Logger;
use crate::record::{EVENT_ERROR, EVENT_WARNING};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Template of records forwarded from `tracing` events.
pub const BRIDGE_TEMPLATE: &str = "Target: {target}; Message: {message}";

/// `tracing_subscriber` layer that forwards `WARN` and `ERROR` events to a
/// [`Logger`] through a bounded channel and background task.
///
/// Warnings become event 2000 and errors event 3000. The layer never waits
/// on the logger: when the channel is full the event is dropped and
/// counted. Events emitted by this crate itself are ignored so a failing
/// adapter cannot feed back into the logger.
pub struct LoggerLayer {
    sender: mpsc::Sender<Forwarded>,
    stats: BridgeStats,
}

/// Counters shared between a [`LoggerLayer`] and whoever installed it.
#[derive(Clone, Debug, Default)]
pub struct BridgeStats {
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events the logger accepted.
    pub forwarded_events: Arc<AtomicU64>,
    /// Dropped because the channel was full or the logger failed.
    pub dropped_events: Arc<AtomicU64>,
}

impl BridgeStats {
    pub fn total(&self) -> u64 {
        self.total_events.load(Ordering::Relaxed)
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded_events.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped_events.load(Ordering::Relaxed)
    }
}

struct Forwarded {
    event_id: i32,
    payload: BTreeMap<String, Value>,
}

impl LoggerLayer {
    /// Create a new layer and spawn the task that drains its channel into
    /// `logger`. Must be called from within a Tokio runtime.
    ///
    /// `buffer` is raised to at least 16.
    pub fn new(logger: Logger, buffer: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<Forwarded>(buffer.max(16));
        let stats = BridgeStats::default();

        let forwarded_bg = Arc::clone(&stats.forwarded_events);
        let dropped_bg = Arc::clone(&stats.dropped_events);

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match logger.log(event.event_id, BRIDGE_TEMPLATE, &event.payload).await {
                    Ok(()) => {
                        forwarded_bg.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => {
                        dropped_bg.fetch_add(1, Ordering::Relaxed);
                        // Not through `tracing`: this task feeds the logger.
                        eprintln!("error forwarding tracing event: {}", e);
                    }
                }
            }
        });

        (LoggerLayer { sender: tx, stats }, handle)
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats.clone()
    }
}

fn event_id(level: &Level) -> Option<i32> {
    if *level == Level::ERROR {
        Some(EVENT_ERROR)
    } else if *level == Level::WARN {
        Some(EVENT_WARNING)
    } else {
        None
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.stats.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        let Some(event_id) = event_id(meta.level()) else {
            return;
        };
        if meta.target().starts_with(env!("CARGO_CRATE_NAME")) {
            return;
        }

        // Metadata goes in first so the event's own fields win a name clash.
        let mut payload = BTreeMap::new();
        payload.insert("target".to_string(), Value::from(meta.target()));
        if let Some(file) = meta.file() {
            payload.insert("file".to_string(), Value::from(file));
        }
        if let Some(line) = meta.line() {
            payload.insert("line".to_string(), Value::from(line));
        }

        let mut message: Option<String> = None;
        event.record(&mut FieldVisitor {
            fields: &mut payload,
            message: &mut message,
        });
        payload.insert("message".to_string(), Value::from(message.unwrap_or_default()));

        if self.sender.try_send(Forwarded { event_id, payload }).is_err() {
            self.stats.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Collects an event's fields as JSON values, pulling `message` aside.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}

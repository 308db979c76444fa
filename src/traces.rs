use crate::adapter::{BoxError, LogAdapter};
use crate::identity::ProviderId;
use crate::record::LogRecord;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Default name of the table traces are written to.
pub const DEFAULT_TRACES_TABLE: &str = "Traces";

/// Column names of the Traces table, in insert order.
pub const TRACES_COLUMNS: [&str; 16] = [
    "InstanceName",
    "ProviderId",
    "ProviderName",
    "EventId",
    "EventKeywords",
    "Level",
    "Opcode",
    "Task",
    "Timestamp",
    "Version",
    "FormattedMessage",
    "Payload",
    "ActivityId",
    "RelatedActivityId",
    "ProcessId",
    "ThreadId",
];

/// One row of the Traces table.
///
/// Only the record fields and the timestamp carry data; the remaining
/// columns exist for schema compatibility and are always zero or null.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TraceRow {
    pub instance_name: String,
    pub provider_id: ProviderId,
    pub provider_name: String,
    pub event_id: i32,
    pub event_keywords: i64,
    pub level: i16,
    pub opcode: i16,
    pub task: i32,
    pub timestamp: DateTime<Utc>,
    pub version: i16,
    pub formatted_message: Option<String>,
    pub payload: Option<String>,
    pub activity_id: Option<Uuid>,
    pub related_activity_id: Option<Uuid>,
    pub process_id: Option<i32>,
    pub thread_id: Option<i32>,
}

impl TraceRow {
    /// Build the row for `record`, stamped with `timestamp`.
    pub fn new(record: LogRecord, timestamp: DateTime<Utc>) -> Self {
        TraceRow {
            instance_name: record.instance_name,
            provider_id: record.provider_id,
            provider_name: record.provider_name,
            event_id: record.event_id,
            event_keywords: 0,
            level: 0,
            opcode: 0,
            task: 0,
            timestamp,
            version: 0,
            formatted_message: Some(record.message),
            payload: Some(record.payload),
            activity_id: None,
            related_activity_id: None,
            process_id: None,
            thread_id: None,
        }
    }
}

/// Client of a durable store holding the Traces table.
///
/// One call is one insert; implementations return the store's error as-is
/// and must not retry or buffer.
#[async_trait]
pub trait TraceStore: Send + Sync {
    async fn insert(&self, row: &TraceRow) -> Result<(), BoxError>;
}

/// Adapter that persists each record as one Traces row, synchronously.
///
/// The timestamp is taken when [`log`](LogAdapter::log) is called. The
/// caller waits for the full store round trip.
#[derive(Clone)]
pub struct TracesLogAdapter {
    store: Arc<dyn TraceStore>,
}

impl TracesLogAdapter {
    pub fn new(store: Arc<dyn TraceStore>) -> Self {
        TracesLogAdapter { store }
    }
}

#[async_trait]
impl LogAdapter for TracesLogAdapter {
    async fn log(&self, record: LogRecord) -> Result<(), BoxError> {
        let row = TraceRow::new(record, Utc::now());
        match self.store.insert(&row).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(event_id = row.event_id, error = %e, "trace insert failed");
                Err(e)
            }
        }
    }
}

/// Row limit of the store behind a `memory://` DSN.
pub const DEFAULT_MEMORY_ROWS: usize = 10_000;

/// In-process [`TraceStore`].
///
/// Unbounded by default; a bounded store evicts its oldest row to make
/// room for a new one. Clones share the same rows.
#[derive(Clone, Default)]
pub struct MemoryTraceStore {
    rows: Arc<Mutex<VecDeque<TraceRow>>>,
    max_rows: Option<usize>,
}

impl MemoryTraceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store keeping at most `max_rows` rows (at least one).
    pub fn bounded(max_rows: usize) -> Self {
        MemoryTraceStore {
            rows: Arc::default(),
            max_rows: Some(max_rows.max(1)),
        }
    }

    /// Copy of every row held, oldest first.
    pub fn rows(&self) -> Vec<TraceRow> {
        self.lock().iter().cloned().collect()
    }

    /// Remove and return every row held, oldest first.
    pub fn drain(&self) -> Vec<TraceRow> {
        self.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<TraceRow>> {
        // Rows are pushed whole, so a poisoned buffer is still consistent.
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TraceStore for MemoryTraceStore {
    async fn insert(&self, row: &TraceRow) -> Result<(), BoxError> {
        let mut rows = self.lock();
        if let Some(max) = self.max_rows {
            while rows.len() >= max {
                rows.pop_front();
            }
        }
        rows.push_back(row.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl TraceStore for FailingStore {
        async fn insert(&self, _row: &TraceRow) -> Result<(), BoxError> {
            Err("duplicate key value violates unique constraint".into())
        }
    }

    fn record() -> LogRecord {
        LogRecord {
            event_id: 1000,
            provider_id: ProviderId::derive("TestProvider"),
            instance_name: "TestInstance".to_string(),
            provider_name: "TestProvider".to_string(),
            message: "FormatLog".to_string(),
            payload: r#"{"data":"Log"}"#.to_string(),
        }
    }

    #[tokio::test]
    async fn inserts_one_row_per_record() {
        let store = MemoryTraceStore::new();
        let adapter = TracesLogAdapter::new(Arc::new(store.clone()));

        let before = Utc::now();
        adapter.log(record()).await.unwrap();
        let after = Utc::now();

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.instance_name, "TestInstance");
        assert_eq!(row.provider_id, ProviderId::derive("TestProvider"));
        assert_eq!(row.event_id, 1000);
        assert_eq!(row.formatted_message.as_deref(), Some("FormatLog"));
        assert_eq!(row.payload.as_deref(), Some(r#"{"data":"Log"}"#));
        assert!(row.timestamp >= before && row.timestamp <= after);
        assert_eq!((row.event_keywords, row.level, row.opcode, row.task, row.version), (0, 0, 0, 0, 0));
        assert!(row.activity_id.is_none() && row.process_id.is_none() && row.thread_id.is_none());
    }

    #[tokio::test]
    async fn store_error_is_returned_verbatim() {
        let adapter = TracesLogAdapter::new(Arc::new(FailingStore));
        let err = adapter.log(record()).await.unwrap_err();
        assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
    }

    #[tokio::test]
    async fn bounded_store_evicts_oldest_rows() {
        let store = MemoryTraceStore::bounded(2);
        for event_id in [1, 2, 3] {
            let mut row = TraceRow::new(record(), Utc::now());
            row.event_id = event_id;
            store.insert(&row).await.unwrap();
        }

        let kept: Vec<i32> = store.drain().into_iter().map(|row| row.event_id).collect();
        assert_eq!(kept, vec![2, 3]);
        assert!(store.is_empty());
    }

    #[test]
    fn row_serializes_with_column_names() {
        let row = TraceRow::new(record(), Utc::now());
        let value = serde_json::to_value(&row).unwrap();
        let object = value.as_object().unwrap();
        for column in TRACES_COLUMNS {
            assert!(object.contains_key(column), "missing {}", column);
        }
        assert_eq!(object.len(), TRACES_COLUMNS.len());
    }
}

use async_trait::async_trait;
use serde::{ser::Error as _, Serialize, Serializer};
use serde_json::{json, Value};
use std::panic::Location;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use traces_logger::caller::{CallerContext, CallerResolver};
use traces_logger::error::{ContextError, HostError};
use traces_logger::host::{FixedHostResolver, HostResolver};
use traces_logger::{BoxError, ChannelLogAdapter, LogAdapter, LogRecord, Logger, LoggerError};

const TEST_PROVIDER_ID: [u8; 16] = [
    234, 68, 28, 207, 51, 0, 144, 71, 174, 0, 96, 247, 203, 164, 92, 120,
];

/// Adapter that keeps every record and counts calls.
#[derive(Default)]
struct RecordingAdapter {
    calls: AtomicUsize,
    records: Mutex<Vec<LogRecord>>,
    fail_with: Option<String>,
}

impl RecordingAdapter {
    fn failing(message: &str) -> Self {
        RecordingAdapter {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last(&self) -> LogRecord {
        self.records.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LogAdapter for RecordingAdapter {
    async fn log(&self, record: LogRecord) -> Result<(), BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(message.clone().into());
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

struct BrokenHost;

impl HostResolver for BrokenHost {
    fn host_name(&self) -> Result<String, HostError> {
        Err(HostError::Unavailable("uname failed".to_string()))
    }
}

struct BrokenCaller;

impl CallerResolver for BrokenCaller {
    fn resolve(&self, _: &'static Location<'static>, _: usize) -> Result<CallerContext, ContextError> {
        Err(ContextError::Unavailable("no stack".to_string()))
    }
}

/// A value whose serialization always fails, like a live handle.
struct Handle;

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("handles cannot be serialized"))
    }
}

#[derive(Serialize)]
struct WithHandle {
    channel: Handle,
}

fn logger(adapter: Arc<RecordingAdapter>) -> Logger {
    Logger::new(adapter, "TestInstance", "TestProvider")
        .with_host_resolver(Arc::new(FixedHostResolver("CAPPDESK-0103".to_string())))
}

#[tokio::test]
async fn log_delivers_formatted_record() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());

    logger
        .log(1000, "Format{data}", &json!({ "data": "Log" }))
        .await
        .unwrap();

    let record = adapter.last();
    assert_eq!(record.event_id, 1000);
    assert_eq!(record.instance_name, "TestInstance");
    assert_eq!(record.provider_name, "TestProvider");
    assert_eq!(record.provider_id.as_bytes(), &TEST_PROVIDER_ID);
    assert_eq!(record.message, "FormatLog");
    assert_eq!(record.payload, r#"{"data":"Log"}"#);
}

#[tokio::test]
async fn info_tags_host_name() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());

    logger.info("Cappta melhor MAE :D").await.unwrap();

    let record = adapter.last();
    assert_eq!(record.event_id, 1000);
    assert_eq!(record.message, "Host: CAPPDESK-0103; Message: Cappta melhor MAE :D");
    assert_eq!(
        record.payload,
        r#"{"hostName":"CAPPDESK-0103","message":"Cappta melhor MAE :D"}"#
    );
}

#[tokio::test]
async fn info_with_system_host() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = Logger::new(adapter.clone(), "TestInstance", "TestProvider");

    logger.info("hello").await.unwrap();

    let record = adapter.last();
    assert!(record.message.starts_with("Host: "));
    assert!(record.message.ends_with("; Message: hello"));
    let payload: Value = serde_json::from_str(&record.payload).unwrap();
    assert!(payload.get("hostName").is_some());
    assert_eq!(payload["message"], "hello");
}

#[tokio::test]
async fn info_propagates_host_failure() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone()).with_host_resolver(Arc::new(BrokenHost));

    let err = logger.info("hello").await.unwrap_err();
    assert!(matches!(err, LoggerError::Host(HostError::Unavailable(_))));
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn warning_reports_calling_operation() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());
    let err = std::io::Error::new(std::io::ErrorKind::Other, "Filho da MAE");

    logger.warning(&err).await.unwrap();

    let record = adapter.last();
    assert_eq!(record.event_id, 2000);
    assert!(record.message.starts_with("Host: CAPPDESK-0103; Operation: "));
    assert!(record.message.contains("warning_reports_calling_operation"), "{}", record.message);
    assert!(record.message.ends_with("; Exception: Filho da MAE"));

    let payload: Value = serde_json::from_str(&record.payload).unwrap();
    assert_eq!(payload["err"], "Filho da MAE");
    assert_eq!(payload["host"], "CAPPDESK-0103");
    assert!(payload["fileName"].as_str().unwrap().ends_with("logger.rs"));
    assert!(payload["lineNumber"].as_u64().unwrap() > 0);
    assert!(payload["operation"]
        .as_str()
        .unwrap()
        .ends_with("warning_reports_calling_operation"));
}

#[tokio::test]
async fn error_reports_calling_operation() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());
    let err = std::io::Error::new(std::io::ErrorKind::Other, "Filho da MAE");

    let line = line!() + 1;
    logger.error(&err).await.unwrap();

    let record = adapter.last();
    assert_eq!(record.event_id, 3000);
    let payload: Value = serde_json::from_str(&record.payload).unwrap();
    assert_eq!(payload["lineNumber"], line);
    assert!(record
        .message
        .contains(&format!("FileName: tests/logger.rs: LineNumber: {};", line)));
    assert!(record.message.contains("error_reports_calling_operation"));
}

#[inline(never)]
fn report_through_wrapper<'a>(
    logger: &'a Logger,
    err: &std::io::Error,
) -> impl std::future::Future<Output = Result<(), LoggerError>> + 'a {
    logger.error(err)
}

#[tokio::test]
async fn caller_depth_skips_wrapper() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone()).with_caller_depth(1);
    let err = std::io::Error::new(std::io::ErrorKind::Other, "wrapped");

    report_through_wrapper(&logger, &err).await.unwrap();

    let payload: Value = serde_json::from_str(&adapter.last().payload).unwrap();
    assert!(
        payload["operation"].as_str().unwrap().ends_with("caller_depth_skips_wrapper"),
        "{}",
        payload["operation"]
    );
}

#[tokio::test]
async fn warning_and_error_propagate_context_failure() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone()).with_caller_resolver(Arc::new(BrokenCaller));
    let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");

    for result in [logger.warning(&err).await, logger.error(&err).await] {
        match result {
            Err(LoggerError::Context(e)) => {
                assert_eq!(e, ContextError::Unavailable("no stack".to_string()))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn warning_and_error_propagate_host_failure() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone()).with_host_resolver(Arc::new(BrokenHost));
    let err = std::io::Error::new(std::io::ErrorKind::Other, "boom");

    assert!(matches!(logger.warning(&err).await, Err(LoggerError::Host(_))));
    assert!(matches!(logger.error(&err).await, Err(LoggerError::Host(_))));
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn unserializable_payload_never_reaches_adapter() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());

    let err = logger
        .log(1000, "{channel}", &WithHandle { channel: Handle })
        .await
        .unwrap_err();

    assert!(matches!(err, LoggerError::Serialization(_)));
    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn non_finite_numbers_never_reach_adapter() {
    #[derive(serde::Serialize)]
    struct Sample {
        ratio: f64,
    }

    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());

    let nan = logger.log(1000, "{ratio}", &Sample { ratio: f64::NAN }).await;
    assert!(matches!(nan, Err(LoggerError::Serialization(_))));

    let mut readings = std::collections::HashMap::new();
    readings.insert("ratio", f64::INFINITY);
    let inf = logger.log(1000, "{ratio}", &readings).await;
    assert!(matches!(inf, Err(LoggerError::Serialization(_))));

    assert_eq!(adapter.calls(), 0);
}

#[tokio::test]
async fn adapter_error_is_returned_verbatim() {
    let adapter = Arc::new(RecordingAdapter::failing("store unreachable"));
    let logger = logger(adapter.clone());

    let err = logger.log(1000, "x", &json!({})).await.unwrap_err();

    match err {
        LoggerError::Adapter(source) => assert_eq!(source.to_string(), "store unreachable"),
        other => panic!("unexpected error: {:?}", other),
    }
    let err = logger.log(1000, "x", &json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), "store unreachable");
    assert_eq!(adapter.calls(), 2);
}

#[tokio::test]
async fn message_and_payload_agree_on_values() {
    let adapter = Arc::new(RecordingAdapter::default());
    let logger = logger(adapter.clone());

    logger
        .log(
            4000,
            "{user} retried {count} times ({ok})",
            &json!({ "user": "ana", "count": 3, "ok": false }),
        )
        .await
        .unwrap();

    let record = adapter.last();
    assert_eq!(record.message, "ana retried 3 times (false)");
    assert_eq!(record.payload, r#"{"count":3,"ok":false,"user":"ana"}"#);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn channel_of_one_applies_backpressure() {
    let (adapter, mut channel) = ChannelLogAdapter::new(1);
    let logger = Logger::new(Arc::new(adapter), "TestInstance", "TestProvider");

    logger.log(1000, "first", &json!({})).await.unwrap();

    let second = {
        let logger = logger.clone();
        tokio::spawn(async move { logger.log(1000, "second", &json!({})).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!second.is_finished());

    assert_eq!(channel.recv().await.unwrap().message, "first");
    second.await.unwrap().unwrap();
    assert_eq!(channel.recv().await.unwrap().message, "second");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loggers_share_one_channel() {
    let (adapter, mut channel) = ChannelLogAdapter::new(4);
    let adapter = Arc::new(adapter);

    let mut producers = Vec::new();
    for provider in ["A", "B", "C"] {
        let logger = Logger::new(adapter.clone(), "node", provider);
        producers.push(tokio::spawn(async move {
            for i in 0..10 {
                logger.log(1000, "{i}", &json!({ "i": i })).await.unwrap();
            }
        }));
    }
    drop(adapter);

    let mut seen = 0;
    let mut last_per_provider = std::collections::HashMap::new();
    while let Some(record) = channel.recv().await {
        let i: i64 = record.message.parse().unwrap();
        let last = last_per_provider.entry(record.provider_name.clone()).or_insert(-1);
        assert!(i > *last, "records from one logger arrive in order");
        *last = i;
        seen += 1;
    }
    for producer in producers {
        producer.await.unwrap();
    }
    assert_eq!(seen, 30);
}

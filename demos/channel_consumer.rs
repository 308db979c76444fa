use std::sync::Arc;

use traces_logger::channel::ChannelLogAdapter;
use traces_logger::logger::Logger;

#[tokio::main]
async fn main() {
    let (adapter, mut channel) = ChannelLogAdapter::new(16);
    let logger = Logger::new(Arc::new(adapter), "demo-host", "ChannelDemo");

    let consumer = tokio::spawn(async move {
        while let Some(record) = channel.recv().await {
            println!(
                "[{}] {} {} {}",
                record.event_id, record.provider_id, record.message, record.payload
            );
        }
    });

    if let Err(e) = logger.info("service started").await {
        eprintln!("info failed: {}", e);
    }

    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "payment gateway timed out");
    if let Err(e) = logger.warning(&err).await {
        eprintln!("warning failed: {}", e);
    }

    if let Err(e) = logger
        .log(
            4100,
            "order {order_id} moved to {state}",
            &serde_json::json!({ "order_id": 123, "state": "shipped" }),
        )
        .await
    {
        eprintln!("log failed: {}", e);
    }

    // Dropping the last logger closes the channel and ends the consumer.
    drop(logger);
    if let Err(e) = consumer.await {
        eprintln!("consumer task failed: {}", e);
    }
}

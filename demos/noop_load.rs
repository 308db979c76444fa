use std::sync::Arc;
use std::time::Instant;

use traces_logger::logger::Logger;
use traces_logger::noop::NoopAdapter;

#[tokio::main]
async fn main() {
    let logger = Logger::new(Arc::new(NoopAdapter), "load-host", "LoadTest");

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        if let Err(e) = logger
            .log(1000, "iteration {i} of {n}", &serde_json::json!({ "i": i, "n": n }))
            .await
        {
            eprintln!("log failed at iteration {}: {}", i, e);
            return;
        }
    }

    let elapsed = start.elapsed();
    println!("noop adapter: formatted {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );
}

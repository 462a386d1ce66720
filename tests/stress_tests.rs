//! Stress tests for concurrent producers
//!
//! These tests verify:
//! - Entries from many threads all reach an async sink
//! - Each producer's entries keep their relative order
//! - Synchronous sinks stay consistent under concurrent writes

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_log_facade::prelude::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

const PRODUCERS: usize = 8;
const PER_PRODUCER: usize = 1_000;

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<(String, usize)>>,
}

#[async_trait]
impl AsyncSink for CollectingSink {
    async fn deliver(&self, entry: &LogEntry, _abort: &SignalListener) -> Result<()> {
        let data = entry.data.as_ref().ok_or_else(|| LoggerError::other("missing data"))?;
        let seq = data["seq"].as_u64().unwrap_or_default() as usize;
        self.entries.lock().push((entry.source.clone(), seq));
        Ok(())
    }

    fn name(&self) -> &str {
        "collecting"
    }
}

#[derive(Default)]
struct CountingSink {
    count: AtomicUsize,
}

impl Sink for CountingSink {
    fn accept(&self, _entry: &LogEntry) -> Result<()> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_producers_keep_per_source_order() {
    let sink = Arc::new(CollectingSink::default());
    let counter = Arc::new(CountingSink::default());
    let factory = LogFactory::builder()
        .shared_async_sink(sink.clone(), None)
        .shared_sink(counter.clone(), None)
        .drain_interval(std::time::Duration::from_millis(5))
        .build()
        .unwrap();

    let logs: Vec<Log> = (0..PRODUCERS)
        .map(|i| factory.create(format!("App.Worker{}", i)).unwrap())
        .collect();

    let handles: Vec<_> = logs
        .into_iter()
        .map(|log| {
            thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    log.write_data(LogLevel::Information, &serde_json::json!({ "seq": seq }));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(factory.shutdown().await.is_completed());
    assert_eq!(counter.count.load(Ordering::Relaxed), PRODUCERS * PER_PRODUCER);

    let entries = sink.entries.lock();
    assert_eq!(entries.len(), PRODUCERS * PER_PRODUCER);

    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (source, seq) in entries.iter() {
        by_source.entry(source.as_str()).or_default().push(*seq);
    }
    assert_eq!(by_source.len(), PRODUCERS);
    for (source, seqs) in by_source {
        let expected: Vec<usize> = (0..PER_PRODUCER).collect();
        assert_eq!(seqs, expected, "entries for {} out of order", source);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_writes_racing_shutdown_are_never_stranded() {
    const TRIALS: usize = 50;
    const RACING_PRODUCERS: usize = 3;
    const PER_RACER: usize = 2_000;

    for trial in 0..TRIALS {
        let sink = Arc::new(CollectingSink::default());
        let factory = LogFactory::builder()
            .shared_async_sink(sink.clone(), None)
            .drain_interval(std::time::Duration::from_millis(1))
            .build()
            .unwrap();

        let producers: Vec<_> = (0..RACING_PRODUCERS)
            .map(|i| {
                let log = factory.create(format!("App.Racer{}", i)).unwrap();
                thread::spawn(move || {
                    for seq in 0..PER_RACER {
                        log.write_data(LogLevel::Warning, &serde_json::json!({ "seq": seq }));
                    }
                })
            })
            .collect();

        let outcome = factory.shutdown().await;
        for producer in producers {
            producer.join().unwrap();
        }

        assert!(outcome.is_completed(), "trial {}: {:?}", trial, outcome);
        let dispatcher = factory.sinks()[0].handle.as_dispatcher().unwrap();
        let metrics = dispatcher.metrics();
        assert_eq!(dispatcher.queue_len(), 0, "trial {}: entries left in a stopped queue", trial);
        assert_eq!(
            metrics.delivered() + metrics.abandoned(),
            (RACING_PRODUCERS * PER_RACER) as u64,
            "trial {}: every entry is delivered or counted as abandoned",
            trial
        );
        assert_eq!(metrics.delivered() as usize, sink.entries.lock().len());
    }
}

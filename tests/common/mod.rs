use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use merge_index::{EngineHandle, EngineOptions, StreamEvent};

/// A fresh scratch root under a per-test temp directory. The `TempDir` is
/// returned alongside so the caller keeps it alive for the test's duration —
/// dropping it removes the directory.
#[allow(dead_code)]
pub fn scratch_root() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("shard");
    (dir, root)
}

/// Options tuned for fast tests: a short checkpoint tick and a short merge
/// interval, so a test doesn't have to wait out the production 10s default.
#[allow(dead_code)]
pub fn fast_options() -> EngineOptions {
    EngineOptions::new()
        .with_checkpoint_interval(Duration::from_millis(5))
        .with_merge_interval(Duration::from_millis(20))
}

/// Drains a stream's events until `EndOfStream`, with a generous timeout so a
/// hung engine fails the test instead of hanging the suite.
#[allow(dead_code)]
pub fn drain(rx: &Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    loop {
        match rx.recv_timeout(Duration::from_secs(10)) {
            Ok(event) => {
                let is_end = matches!(event, StreamEvent::EndOfStream { .. });
                events.push(event);
                if is_end {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    events
}

/// Streams a bucket from `engine` and waits for it to complete.
#[allow(dead_code)]
pub fn stream_bucket(engine: &EngineHandle, bucket: &[u8], correlation: u64) -> Vec<StreamEvent> {
    let (tx, rx) = mpsc::channel();
    engine.stream(bucket, tx, correlation).unwrap();
    drain(&rx)
}

/// Polls `stream_bucket` until it returns more than just `EndOfStream`, or
/// `timeout` elapses — used to wait out a background merge without a fixed
/// sleep.
#[allow(dead_code)]
pub fn wait_for_non_empty(engine: &EngineHandle, bucket: &[u8], correlation: u64, timeout: Duration) -> Vec<StreamEvent> {
    let deadline = std::time::Instant::now() + timeout;
    loop {
        let events = stream_bucket(engine, bucket, correlation);
        if events.len() > 1 || std::time::Instant::now() >= deadline {
            return events;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

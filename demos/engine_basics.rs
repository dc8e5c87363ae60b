use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Error;
use merge_index::{EngineHandle, EngineOptions};

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn index_a_few_documents(root: &Path) -> Result<(), Error> {
    let engine = EngineHandle::start(root.to_path_buf(), EngineOptions::new())?;

    engine.put(b"index/title/rust", b"doc-1", b"")?;
    engine.put(b"index/title/rust", b"doc-2", b"")?;
    engine.put(b"index/title/async", b"doc-2", b"")?;

    // the default merge interval is 10s; give one merge a chance to land
    // before reading back.
    std::thread::sleep(Duration::from_secs(11));

    let (sink, results) = mpsc::channel();
    engine.stream(b"index/title/rust", sink, 1)?;
    for event in results {
        println!("{event:?}");
    }

    engine.shutdown()?;
    Ok(())
}

fn index_with_a_short_merge_interval(root: &Path) -> Result<(), Error> {
    let options = EngineOptions::new()
        .with_checkpoint_interval(Duration::from_millis(20))
        .with_merge_interval(Duration::from_millis(100));
    let engine = EngineHandle::start(root.to_path_buf(), options)?;

    for i in 0..50 {
        engine.put(b"index/title/async", format!("doc-{i}").as_bytes(), b"")?;
    }
    std::thread::sleep(Duration::from_millis(300));

    let (sink, results) = mpsc::channel();
    engine.stream(b"index/title/async", sink, 2)?;
    let count = results.into_iter().filter(|e| matches!(e, merge_index::StreamEvent::Record { .. })).count();
    println!("indexed {count} documents under index/title/async");

    engine.shutdown()?;
    Ok(())
}

// cargo run --example engine_basics
pub fn main() -> Result<(), Error> {
    let root = PathBuf::from("./target/demo-shard");
    index_a_few_documents(&root)?;

    let fast_root = PathBuf::from("./target/demo-shard-fast");
    index_with_a_short_merge_interval(&fast_root)?;

    Ok(())
}

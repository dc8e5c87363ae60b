use std::time::Duration;

use merge_index::{EngineHandle, StreamEvent};

mod common;

fn values(events: &[StreamEvent]) -> Vec<Vec<u8>> {
    events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Record { value, .. } => Some(value.clone()),
            StreamEvent::EndOfStream { .. } => None,
        })
        .collect()
}

/// §8 scenario 6: put into A, wait for a merge, put more into both A and B,
/// wait for a second merge — both buckets end up with the full accumulated
/// set of values.
#[test]
fn a_second_merge_accumulates_on_top_of_the_first() -> Result<(), anyhow::Error> {
    let (_dir, root) = common::scratch_root();
    let engine = EngineHandle::start(&root, common::fast_options())?;

    for i in 0..100 {
        engine.put(b"A", format!("a{i:03}").as_bytes(), b"")?;
    }
    let first = common::wait_for_non_empty(&engine, b"A", 1, Duration::from_secs(5));
    assert_eq!(values(&first).len(), 100);

    for i in 100..150 {
        engine.put(b"A", format!("a{i:03}").as_bytes(), b"")?;
    }
    for i in 0..50 {
        engine.put(b"B", format!("b{i:03}").as_bytes(), b"")?;
    }

    let deadline = std::time::Instant::now() + Duration::from_secs(10);
    let mut a = common::stream_bucket(&engine, b"A", 2);
    while values(&a).len() < 150 && std::time::Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(30));
        a = common::stream_bucket(&engine, b"A", 2);
    }
    let b = common::wait_for_non_empty(&engine, b"B", 3, Duration::from_secs(5));

    assert_eq!(values(&a).len(), 150);
    assert_eq!(values(&b).len(), 50);

    engine.shutdown()?;
    Ok(())
}

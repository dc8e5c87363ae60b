use std::time::Duration;

use merge_index::{EngineHandle, StreamEvent};

mod common;

/// §8 scenario 4, from the public API's viewpoint: after a merge, each
/// bucket streams back exactly and only the values put into it, regardless
/// of how the puts were interleaved across buckets. The merge/index
/// builder's unit tests (`merge.rs`) separately verify the underlying data
/// file actually lays the three buckets out as contiguous, sorted regions.
#[test]
fn interleaved_buckets_each_stream_their_own_values() -> Result<(), anyhow::Error> {
    let (_dir, root) = common::scratch_root();
    let engine = EngineHandle::start(&root, common::fast_options())?;

    for (bucket, value) in [(b"B" as &[u8], b"b1" as &[u8]), (b"A", b"a1"), (b"B", b"b2"), (b"C", b"c1"), (b"A", b"a2")] {
        engine.put(bucket, value, b"")?;
    }

    let a = common::wait_for_non_empty(&engine, b"A", 1, Duration::from_secs(5));
    let b = common::stream_bucket(&engine, b"B", 2);
    let c = common::stream_bucket(&engine, b"C", 3);

    let values = |events: &[StreamEvent]| -> Vec<Vec<u8>> {
        events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Record { value, .. } => Some(value.clone()),
                StreamEvent::EndOfStream { .. } => None,
            })
            .collect()
    };

    assert_eq!(values(&a), vec![b"a1".to_vec(), b"a2".to_vec()]);
    assert_eq!(values(&b), vec![b"b1".to_vec(), b"b2".to_vec()]);
    assert_eq!(values(&c), vec![b"c1".to_vec()]);

    engine.shutdown()?;
    Ok(())
}

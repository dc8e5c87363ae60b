use std::time::Duration;

use merge_index::{EngineHandle, StreamEvent};

mod common;

#[test]
fn repeated_identical_puts_collapse_to_one_value() -> Result<(), anyhow::Error> {
    let (_dir, root) = common::scratch_root();
    let engine = EngineHandle::start(&root, common::fast_options())?;

    for _ in 0..3 {
        engine.put(b"A", b"v1", b"")?;
    }
    let events = common::wait_for_non_empty(&engine, b"A", 3, Duration::from_secs(5));

    assert_eq!(
        events,
        vec![
            StreamEvent::Record { value: b"v1".to_vec(), props: b"".to_vec(), correlation: 3 },
            StreamEvent::EndOfStream { correlation: 3 },
        ]
    );

    engine.shutdown()?;
    Ok(())
}

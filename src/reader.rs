//! The reader / streamer (§4.7).
//!
//! Looking a bucket up in the in-memory directory and positional-reading
//! exactly its byte range mirrors `sort_command.rs::read_records`'s
//! `seek` + `read_exact` pattern, generalized from a text-line chunk to a
//! framed-record bucket region.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::mpsc::Sender;

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::framing::{self, FrameOutcome};
use crate::record::Record;

/// One event delivered to a `stream` caller's sink, terminated by
/// `EndOfStream` (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    Record { value: Vec<u8>, props: Vec<u8>, correlation: u64 },
    EndOfStream { correlation: u64 },
}

/// Streams every `(value, props)` ever inserted into `bucket`, deduplicated
/// by adjacent `value`, to `sink`. An absent bucket is not an error — it
/// yields an immediate end-of-stream (§4.7, §7).
pub(crate) fn stream(
    data_path: &Path,
    directory: &Directory,
    bucket: &[u8],
    sink: &Sender<StreamEvent>,
    correlation: u64,
    max_frame_size: u32,
) -> Result<()> {
    let descriptor = match directory.get(bucket) {
        Some(descriptor) => *descriptor,
        None => {
            send(sink, StreamEvent::EndOfStream { correlation })?;
            return Ok(());
        }
    };

    let mut file = File::open(data_path)?;
    file.seek(SeekFrom::Start(descriptor.offset))?;
    let mut reader = BufReader::new(file.take(descriptor.size));

    let mut last_value: Option<Vec<u8>> = None;
    let mut frames_read: u64 = 0;

    loop {
        match framing::read_frame(&mut reader, max_frame_size)? {
            FrameOutcome::Frame(payload) => {
                frames_read += 1;
                let record = Record::decode(&payload)?;
                if last_value.as_deref() != Some(record.value.as_slice()) {
                    send(
                        sink,
                        StreamEvent::Record { value: record.value.clone(), props: record.props, correlation },
                    )?;
                    last_value = Some(record.value);
                }
            }
            FrameOutcome::CleanEof => break,
            FrameOutcome::Truncated => {
                return Err(Error::corruption(
                    data_path,
                    format!("truncated frame within bucket region (offset={}, size={})", descriptor.offset, descriptor.size),
                ));
            }
        }
    }

    if frames_read != descriptor.count {
        return Err(Error::corruption(
            data_path,
            format!(
                "bucket region framed to {frames_read} records but directory claims {}",
                descriptor.count
            ),
        ));
    }

    send(sink, StreamEvent::EndOfStream { correlation })?;
    Ok(())
}

fn send(sink: &Sender<StreamEvent>, event: StreamEvent) -> Result<()> {
    sink.send(event).map_err(|_| Error::Disconnected)
}

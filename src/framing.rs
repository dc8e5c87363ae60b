//! Length-prefixed record framing: `[size: u32 big-endian][payload: size bytes]`.
//!
//! `size` never includes its own 4 bytes. A frame reader that hits a clean
//! end-of-stream right at a frame boundary reports [`FrameOutcome::CleanEof`];
//! one that hits end-of-stream partway through a prefix or payload reports
//! [`FrameOutcome::Truncated`] so callers can decide whether that's a
//! recoverable end-of-stream (external sort/merge, §4.1) or corruption (the
//! reader path, §4.7).

use std::io::{self, Read, Write};

pub(crate) const LENGTH_PREFIX_BYTES: usize = 4;

#[derive(Debug)]
pub(crate) enum FrameOutcome {
    Frame(Vec<u8>),
    CleanEof,
    Truncated,
}

/// Writes one framed record.
pub(crate) fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let size = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "payload too large to frame"))?;
    writer.write_all(&size.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

/// Total on-disk size of a framed record with the given payload length.
pub(crate) fn framed_len(payload_len: usize) -> u64 {
    LENGTH_PREFIX_BYTES as u64 + payload_len as u64
}

fn read_partial<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..])? {
            0 => break,
            n => total += n,
        }
    }
    Ok(total)
}

/// Reads one framed record, distinguishing a clean end-of-stream from a
/// truncated one.
pub(crate) fn read_frame<R: Read>(reader: &mut R, max_frame_size: u32) -> io::Result<FrameOutcome> {
    let mut len_buf = [0u8; LENGTH_PREFIX_BYTES];
    let n = read_partial(reader, &mut len_buf)?;
    if n == 0 {
        return Ok(FrameOutcome::CleanEof);
    }
    if n < LENGTH_PREFIX_BYTES {
        return Ok(FrameOutcome::Truncated);
    }

    let size = u32::from_be_bytes(len_buf);
    if size == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "zero-length frame"));
    }
    if size > max_frame_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame size {size} exceeds configured maximum {max_frame_size}"),
        ));
    }

    let mut payload = vec![0u8; size as usize];
    let read = read_partial(reader, &mut payload)?;
    if read < payload.len() {
        return Ok(FrameOutcome::Truncated);
    }
    Ok(FrameOutcome::Frame(payload))
}

/// Iterates framed records from `reader`, stopping at either a clean or a
/// truncated end-of-stream — suitable for the external-sort/merge path where
/// both are treated as end-of-stream (§4.1).
pub(crate) struct FrameReader<R> {
    reader: R,
    max_frame_size: u32,
}

impl<R: Read> FrameReader<R> {
    pub(crate) fn new(reader: R, max_frame_size: u32) -> FrameReader<R> {
        FrameReader { reader, max_frame_size }
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match read_frame(&mut self.reader, self.max_frame_size) {
            Ok(FrameOutcome::Frame(payload)) => Some(Ok(payload)),
            Ok(FrameOutcome::CleanEof) | Ok(FrameOutcome::Truncated) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

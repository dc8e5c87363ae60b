//! The external sort/merge adapter (§4.3).
//!
//! `sort_rawfiles` produces `R.rawmerged`: every pending record, across all
//! rawfiles, framed identically, ordered by [`Record`]'s `Ord` impl. For the
//! data volumes a single merge cycle absorbs (accumulated puts since the
//! last merge, not the whole index), sorting fully in memory is simplest and
//! keeps this module small; `merge_sorted_streams` then performs the actual
//! *external* merge — the old `R.data` (already sorted) unioned with
//! `R.rawmerged` — holding only one buffered record per input file at a
//! time, via a `BinaryHeap` k-way merge keyed on decoded records, reversed
//! so the max-heap surfaces the smallest head first.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::framing::{self, FrameOutcome, FrameReader};
use crate::merge::MergeBuilder;
use crate::record::Record;

/// Reads every framed record out of `rawfiles`, sorts them under
/// [`Record::cmp`], and writes the result to `output`.
pub(crate) fn sort_rawfiles(
    rawfiles: &[PathBuf],
    output: &Path,
    max_frame_size: u32,
    buffer_bytes: usize,
) -> Result<()> {
    let mut records = Vec::new();
    for path in rawfiles {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        for payload in FrameReader::new(reader, max_frame_size) {
            records.push(Record::decode(&payload?)?);
        }
    }
    records.sort();

    let file = File::create(output)?;
    let mut writer = BufWriter::with_capacity(buffer_bytes, file);
    for record in &records {
        framing::write_frame(&mut writer, &record.encode()?)?;
    }
    Ok(())
}

/// One sorted input file to the k-way merge, buffering exactly one decoded
/// record ahead (its "head").
struct UnmergedSource {
    reader: BufReader<File>,
    head: Record,
    max_frame_size: u32,
}

impl UnmergedSource {
    /// Opens `path` for the merge. Returns `Ok(None)` if the file is empty —
    /// an empty input contributes nothing and is simply left out of the
    /// heap (§4.4 "empty input streams").
    fn open(path: &Path, max_frame_size: u32) -> Result<Option<UnmergedSource>> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        match Self::read_next(&mut reader, max_frame_size)? {
            Some(head) => Ok(Some(UnmergedSource { reader, head, max_frame_size })),
            None => Ok(None),
        }
    }

    fn read_next(reader: &mut BufReader<File>, max_frame_size: u32) -> Result<Option<Record>> {
        match framing::read_frame(reader, max_frame_size)? {
            FrameOutcome::Frame(payload) => Ok(Some(Record::decode(&payload)?)),
            FrameOutcome::CleanEof | FrameOutcome::Truncated => Ok(None),
        }
    }

    /// Consumes the current head, advancing to the next record if any.
    /// Returns the consumed head and whether another one follows.
    fn advance(mut self) -> Result<(Record, Option<UnmergedSource>)> {
        let consumed = self.head;
        match Self::read_next(&mut self.reader, self.max_frame_size)? {
            Some(next) => {
                self.head = next;
                Ok((consumed, Some(self)))
            }
            None => Ok((consumed, None)),
        }
    }
}

impl PartialEq for UnmergedSource {
    fn eq(&self, other: &Self) -> bool {
        self.head == other.head
    }
}

impl Eq for UnmergedSource {}

impl PartialOrd for UnmergedSource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reversed so `BinaryHeap`, a max-heap, surfaces the *smallest* head first.
impl Ord for UnmergedSource {
    fn cmp(&self, other: &Self) -> Ordering {
        other.head.cmp(&self.head)
    }
}

/// Drives `builder` with the union of `inputs` (each already sorted) under
/// `Record`'s total order, in true streaming fashion — at most one record
/// per input is held in memory at a time.
pub(crate) fn merge_sorted_streams(
    inputs: &[PathBuf],
    max_frame_size: u32,
    builder: &mut MergeBuilder,
) -> Result<()> {
    let mut heap = std::collections::BinaryHeap::new();
    for path in inputs {
        if let Some(source) = UnmergedSource::open(path, max_frame_size)? {
            heap.push(source);
        }
    }

    while let Some(top) = heap.pop() {
        let (record, rest) = top.advance()?;
        builder.accept(record)?;
        if let Some(rest) = rest {
            heap.push(rest);
        }
    }
    Ok(())
}

//! The merge / index builder (§4.4).
//!
//! `MergeBuilder` is an explicit fold state threaded through `accept`/`finish`
//! calls (rather than a closure returning the next closure), driven here by
//! [`crate::extsort::merge_sorted_streams`].
//!
//! [`run_merge`] is the component's full entry point: sort the pending
//! rawfiles, merge them against the current data file, and produce the new
//! data file plus its bucket directory — everything between "we have a
//! rawfile snapshot" and "we have a new data file and directory ready to
//! install" (§2 component 4, §4.4, §4.6).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::directory::{BucketDescriptor, Directory};
use crate::error::Result;
use crate::extsort;
use crate::framing;
use crate::record::Record;

pub(crate) struct MergeBuilder {
    writer: BufWriter<File>,
    pos: u64,
    /// `(bucket, value)` of the most recently written record, used to
    /// detect adjacent duplicates (§4.4).
    last: Option<(Vec<u8>, Vec<u8>)>,
    /// The descriptor being accumulated for the bucket currently open.
    current: Option<(Vec<u8>, BucketDescriptor)>,
    directory: Directory,
}

impl MergeBuilder {
    pub(crate) fn new(output_path: &Path, buffer_bytes: usize) -> Result<MergeBuilder> {
        let file = File::create(output_path)?;
        Ok(MergeBuilder {
            writer: BufWriter::with_capacity(buffer_bytes, file),
            pos: 0,
            last: None,
            current: None,
            directory: Directory::new(),
        })
    }

    /// Folds one more record from the merged sorted stream into the output.
    pub(crate) fn accept(&mut self, record: Record) -> Result<()> {
        let payload = record.encode()?;
        let framed_size = framing::framed_len(payload.len());
        let same_bucket = self
            .last
            .as_ref()
            .map(|(bucket, _)| *bucket == record.bucket)
            .unwrap_or(false);
        let adjacent_duplicate = self
            .last
            .as_ref()
            .map(|(bucket, value)| *bucket == record.bucket && *value == record.value)
            .unwrap_or(false);

        if adjacent_duplicate {
            return Ok(());
        }

        if !same_bucket {
            if let Some((bucket, descriptor)) = self.current.take() {
                self.directory.insert(bucket, descriptor);
            }
            self.current = Some((
                record.bucket.clone(),
                BucketDescriptor { offset: self.pos, size: 0, count: 0 },
            ));
        }

        framing::write_frame(&mut self.writer, &payload)?;
        let descriptor = &mut self.current.as_mut().expect("current bucket is always set above").1;
        descriptor.size += framed_size;
        descriptor.count += 1;
        self.pos += framed_size;
        self.last = Some((record.bucket, record.value));
        Ok(())
    }

    /// Commits the final bucket (if any) and flushes the output file.
    pub(crate) fn finish(mut self) -> Result<Directory> {
        if let Some((bucket, descriptor)) = self.current.take() {
            self.directory.insert(bucket, descriptor);
        }
        self.writer.flush()?;
        Ok(self.directory)
    }
}

/// Runs one full merge cycle: sort `rawfiles`, merge them against
/// `old_data_path` (the current, already-sorted data file — possibly
/// nonexistent on a fresh root), and write `merged_path` / persist the
/// resulting directory to `buckets_merged_path`.
///
/// Returns the new in-memory [`Directory`]; the caller (the engine's owner
/// thread, on receipt of `MergeComplete`) is responsible for installing
/// both files with [`crate::swap::install`] (§4.6, §4.8).
pub(crate) fn run_merge(
    old_data_path: &Path,
    rawfiles: &[PathBuf],
    rawmerged_path: &Path,
    merged_path: &Path,
    buckets_merged_path: &Path,
    max_frame_size: u32,
    buffer_bytes: usize,
) -> Result<Directory> {
    log::info!("start merge cycle over {} rawfile(s)", rawfiles.len());
    extsort::sort_rawfiles(rawfiles, rawmerged_path, max_frame_size, buffer_bytes)?;

    if !old_data_path.exists() {
        File::create(old_data_path)?;
    }

    let mut builder = MergeBuilder::new(merged_path, buffer_bytes)?;
    extsort::merge_sorted_streams(
        &[old_data_path.to_path_buf(), rawmerged_path.to_path_buf()],
        max_frame_size,
        &mut builder,
    )?;
    let directory = builder.finish()?;
    directory.save(buckets_merged_path)?;

    let _ = std::fs::remove_file(rawmerged_path);
    log::info!("finish merge cycle, {} bucket(s) in the new directory", directory.len());
    Ok(directory)
}

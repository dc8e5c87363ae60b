//! The rawfile writer (§4.2): flushes the current write buffer to a freshly
//! named rawfile. Naming hex-encodes 16 random bytes with
//! `data_encoding::HEXLOWER`, the same scheme used for scratch-file names
//! elsewhere in this crate's tests.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use data_encoding::HEXLOWER;

use crate::error::Result;
use crate::framing;
use crate::record::Record;

/// Builds a fresh `<root>.raw.<rand>` path. Exposed so startup recovery
/// (§7) can recognize rawfiles by the same naming scheme.
pub(crate) fn rawfile_path(root: &Path) -> PathBuf {
    let suffix = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    let mut name = root.as_os_str().to_owned();
    name.push(".raw.");
    name.push(suffix);
    PathBuf::from(name)
}

pub(crate) fn is_rawfile(root: &Path, candidate: &Path) -> bool {
    let mut prefix = root.as_os_str().to_owned();
    prefix.push(".raw.");
    candidate
        .as_os_str()
        .to_str()
        .zip(prefix.to_str())
        .map(|(c, p)| c.starts_with(p))
        .unwrap_or(false)
}

/// Appends `buffer` to a freshly named rawfile and returns its path. An
/// empty buffer produces no rawfile (§4.2).
pub(crate) fn flush(root: &Path, buffer: &[Record], buffer_bytes: usize) -> Result<Option<PathBuf>> {
    if buffer.is_empty() {
        return Ok(None);
    }

    let path = rawfile_path(root);
    log::debug!("flushing {} buffered record(s) to {}", buffer.len(), path.display());
    let file = File::create(&path)?;
    let mut writer = BufWriter::with_capacity(buffer_bytes, file);
    for record in buffer {
        let payload = record.encode()?;
        framing::write_frame(&mut writer, &payload)?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    log::info!("flushed rawfile {}", path.display());
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_buffer_produces_no_rawfile() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let result = flush(&root, &[], 4096).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn flush_writes_framed_records_in_buffer_order() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let buffer = vec![
            Record::new(b"A", b"v1", 1, b""),
            Record::new(b"A", b"v2", 2, b""),
        ];
        let path = flush(&root, &buffer, 4096).unwrap().unwrap();
        assert!(is_rawfile(&root, &path));

        let bytes = std::fs::read(&path).unwrap();
        let records: Vec<_> = framing::FrameReader::new(std::io::Cursor::new(bytes), 1024 * 1024)
            .collect::<std::io::Result<Vec<_>>>()
            .unwrap()
            .into_iter()
            .map(|payload| Record::decode(&payload).unwrap())
            .collect();
        assert_eq!(records, buffer);
    }
}

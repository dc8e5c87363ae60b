//! The bucket directory store (§4.5): a persistent map
//! `bucket -> {offset, size, count}` serialized as a single blob.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::swap;

/// `{ offset, size, count }` for a single bucket's contiguous region in the
/// data file (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDescriptor {
    pub offset: u64,
    pub size: u64,
    pub count: u64,
}

/// `bucket -> descriptor`. A `BTreeMap` is used rather than a hash map
/// purely so serialization is deterministic and diffable; lookup is the
/// only operation the engine itself requires (§3).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Directory {
    buckets: BTreeMap<Vec<u8>, BucketDescriptor>,
}

impl Directory {
    pub(crate) fn new() -> Directory {
        Directory::default()
    }

    pub(crate) fn insert(&mut self, bucket: Vec<u8>, descriptor: BucketDescriptor) {
        self.buckets.insert(bucket, descriptor);
    }

    pub fn get(&self, bucket: &[u8]) -> Option<&BucketDescriptor> {
        self.buckets.get(bucket)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &BucketDescriptor)> {
        self.buckets.iter()
    }

    /// Loads the directory from `path`. A missing file is treated as an
    /// empty directory, which is then persisted so subsequent loads see a
    /// real (if empty) blob.
    pub(crate) fn load(path: &Path) -> Result<Directory> {
        if !path.exists() {
            let empty = Directory::new();
            empty.save(path)?;
            return Ok(empty);
        }
        let bytes = std::fs::read(path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| Error::corruption(path, format!("failed to decode bucket directory: {e}")))
    }

    /// Serializes to a staging file and installs it via rename, so a
    /// concurrent `load` never observes a partially written blob.
    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let staging = swap::staging_path(path);
        {
            let file = File::create(&staging)?;
            let mut writer = BufWriter::new(file);
            bincode::serialize_into(&mut writer, self)
                .map_err(|e| Error::InvalidInput(format!("failed to encode bucket directory: {e}")))?;
        }
        std::fs::rename(&staging, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_yields_empty_and_persists_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("root.buckets");
        let directory = Directory::load(&path).unwrap();
        assert!(directory.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("root.buckets");
        let mut directory = Directory::new();
        directory.insert(b"A".to_vec(), BucketDescriptor { offset: 0, size: 10, count: 2 });
        directory.insert(b"B".to_vec(), BucketDescriptor { offset: 10, size: 5, count: 1 });
        directory.save(&path).unwrap();

        let loaded = Directory::load(&path).unwrap();
        assert_eq!(loaded.get(b"A"), Some(&BucketDescriptor { offset: 0, size: 10, count: 2 }));
        assert_eq!(loaded.get(b"B"), Some(&BucketDescriptor { offset: 10, size: 5, count: 1 }));
        assert_eq!(loaded.get(b"C"), None);
    }
}

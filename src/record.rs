//! The record codec (§4.1): the opaque byte serialization of a
//! `(bucket, value, timestamp, props)` tuple. The engine never interprets
//! `value` or `props` beyond carrying them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Record {
    pub(crate) bucket: Vec<u8>,
    pub(crate) value: Vec<u8>,
    pub(crate) timestamp: u64,
    pub(crate) props: Vec<u8>,
}

impl Record {
    pub(crate) fn new(bucket: &[u8], value: &[u8], timestamp: u64, props: &[u8]) -> Record {
        Record {
            bucket: bucket.to_vec(),
            value: value.to_vec(),
            timestamp,
            props: props.to_vec(),
        }
    }

    /// Serializes to the opaque payload that gets framed on disk.
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| Error::InvalidInput(format!("failed to encode record: {e}")))
    }

    pub(crate) fn decode(payload: &[u8]) -> Result<Record> {
        bincode::deserialize(payload)
            .map_err(|e| Error::InvalidInput(format!("failed to decode record: {e}")))
    }
}

/// The total order the external sort/merge adapter sorts under (§4.3):
/// bucket first, so a bucket's records land contiguously in the merged
/// output, then value, then timestamp as the final tie-break (§3 — the
/// timestamp exists precisely to make otherwise-identical insertions
/// distinguishable during sort, even though adjacent-duplicate collapsing
/// in the merge builder ignores it).
impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bucket
            .cmp(&other.bucket)
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.timestamp.cmp(&other.timestamp))
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_record() {
        let record = Record::new(b"bucket", b"value", 42, b"props");
        let payload = record.encode().unwrap();
        let decoded = Record::decode(&payload).unwrap();
        assert_eq!(record, decoded);
    }

    #[test]
    fn bucket_is_the_primary_sort_key() {
        let a = Record::new(b"A", b"zzzzzz", 1, b"");
        let b = Record::new(b"B", b"aaaaaa", 2, b"");
        assert!(a < b, "records with bucket A must sort before bucket B regardless of value");
    }

    #[test]
    fn timestamp_breaks_ties_within_identical_bucket_and_value() {
        let earlier = Record::new(b"A", b"v1", 1, b"");
        let later = Record::new(b"A", b"v1", 2, b"");
        assert!(earlier < later);
    }
}

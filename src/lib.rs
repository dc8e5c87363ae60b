//! This crate implements an append-optimized, bucket-partitioned inverted
//! index storage engine: given a continuous stream of `(bucket, value,
//! props)` insertions, it persists them on disk grouped by bucket and, on
//! demand, streams back every value ever inserted for a given bucket in a
//! stable, deduplicated order.
//!
//! It is an LSM-style pipeline: an in-memory write buffer, periodic flush to
//! on-disk *rawfiles*, a background merge that externally sorts rawfiles
//! against the main data file and emits a new data file plus a bucket
//! directory, and an atomic file-swap that installs the merged state. It is
//! designed for a search-indexing use case where writes dominate reads and
//! each bucket (typically an `index/field/term` triple) accumulates a
//! posting list of document references.
//!
//! The engine is not a general key-value store: there is no delete, no
//! per-value update, and readers only ever observe the bucket contents as of
//! the most recently completed merge — records still sitting in the buffer
//! or in a pending rawfile are invisible to `stream` until the next merge
//! absorbs them.
//!
//! # Examples
//! ```no_run
//! use merge_index::{EngineHandle, EngineOptions};
//! use std::sync::mpsc;
//!
//! fn index_and_query(root: std::path::PathBuf) -> Result<(), merge_index::Error> {
//!     let engine = EngineHandle::start(root, EngineOptions::new())?;
//!
//!     engine.put(b"index/title/rust", b"doc-42", b"")?;
//!
//!     let (sink, results) = mpsc::channel();
//!     engine.stream(b"index/title/rust", sink, 1)?;
//!     for event in results {
//!         println!("{event:?}");
//!     }
//!
//!     engine.shutdown()
//! }
//! ```

pub(crate) mod directory;
pub(crate) mod engine;
pub(crate) mod error;
pub(crate) mod extsort;
pub(crate) mod framing;
pub(crate) mod merge;
pub(crate) mod rawfile;
pub(crate) mod reader;
pub(crate) mod record;
pub(crate) mod recovery;
pub(crate) mod swap;

pub mod config;

pub use config::EngineOptions;
pub use engine::EngineHandle;
pub use error::{Error, Result};
pub use reader::StreamEvent;

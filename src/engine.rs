//! The engine / state machine (§4.6) and its public API.
//!
//! An owner-task pattern: mailbox + single-threaded state mutation, with a
//! dedicated `std::thread` draining a `std::sync::mpsc::Receiver<EngineCommand>`
//! standing in for the actor, and `command_executor::thread_pool::ThreadPool`
//! dispatching the single background merge task.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use command_executor::command::Command;
use command_executor::shutdown_mode::ShutdownMode;
use command_executor::thread_pool::ThreadPool;
use command_executor::thread_pool_builder::ThreadPoolBuilder;

use crate::config::EngineOptions;
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::merge;
use crate::rawfile;
use crate::reader::{self, StreamEvent};
use crate::recovery;
use crate::record::Record;

enum EngineCommand {
    Put(Record),
    Stream { bucket: Vec<u8>, sink: Sender<StreamEvent>, correlation: u64 },
    Checkpoint,
    MergeComplete { directory: Directory, consumed_rawfiles: Vec<PathBuf> },
    Shutdown,
}

/// A handle to a running engine. Cloning is not supported — `put` and
/// `stream` take `&self` and are safe to call from multiple threads
/// concurrently, since both are just mailbox sends; the owner thread
/// serializes the actual state mutation (§5).
pub struct EngineHandle {
    mailbox: Sender<EngineCommand>,
    owner: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

fn suffixed(root: &Path, suffix: &str) -> PathBuf {
    let mut path = root.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

fn now_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

impl EngineHandle {
    /// Starts an engine rooted at `root`, recovering any rawfiles orphaned
    /// by a crash mid-merge and cleaning up transient merge output left
    /// behind by one that never completed (§7, §9 open question 2).
    pub fn start(root: impl Into<PathBuf>, options: EngineOptions) -> Result<EngineHandle> {
        let root = root.into();
        recovery::clean_transient_merge_files(&root)?;
        let mut rawfiles = recovery::recover_pending_rawfiles(&root)?;
        rawfiles.sort();

        let data_path = suffixed(&root, ".data");
        let buckets_path = suffixed(&root, ".buckets");
        if !data_path.exists() {
            std::fs::File::create(&data_path)?;
        }
        let directory = Directory::load(&buckets_path)?;

        let thread_pool = ThreadPoolBuilder::new()
            .with_name("merge_index-merge".to_string())
            .with_tasks(1)
            .with_queue_size(1)
            .with_shutdown_mode(ShutdownMode::CompletePending)
            .build()
            .map_err(|e| Error::InvalidInput(format!("failed to start merge thread pool: {e}")))?;

        let (tx, rx) = mpsc::channel();

        let checkpoint_interval = options.checkpoint_interval();
        let ticker_mailbox = tx.clone();
        let ticker = thread::spawn(move || loop {
            thread::sleep(checkpoint_interval);
            if ticker_mailbox.send(EngineCommand::Checkpoint).is_err() {
                break;
            }
        });

        let owner_mailbox = tx.clone();
        let owner = thread::spawn(move || {
            run_owner(OwnerState {
                root,
                options,
                data_path,
                buckets_path,
                directory,
                rawfiles,
                buffer: Vec::new(),
                last_merge_time: Instant::now(),
                is_merging: false,
                thread_pool,
                mailbox: owner_mailbox,
                rx,
            });
        });

        Ok(EngineHandle { mailbox: tx, owner: Some(owner), ticker: Some(ticker) })
    }

    /// Appends `(bucket, value, props)` to the write buffer. The timestamp
    /// is captured here, at call time (§4.6).
    pub fn put(&self, bucket: &[u8], value: &[u8], props: &[u8]) -> Result<()> {
        let record = Record::new(bucket, value, now_ts(), props);
        self.mailbox.send(EngineCommand::Put(record)).map_err(|_| Error::Disconnected)
    }

    /// Streams every value ever inserted for `bucket` to `sink`, terminated
    /// by a `StreamEvent::EndOfStream` carrying `correlation` (§4.7).
    pub fn stream(&self, bucket: &[u8], sink: Sender<StreamEvent>, correlation: u64) -> Result<()> {
        self.mailbox
            .send(EngineCommand::Stream { bucket: bucket.to_vec(), sink, correlation })
            .map_err(|_| Error::Disconnected)
    }

    /// Stops the owner and checkpoint-ticker threads and waits for any
    /// in-flight background merge to finish (`ShutdownMode::CompletePending`).
    pub fn shutdown(mut self) -> Result<()> {
        self.mailbox.send(EngineCommand::Shutdown).map_err(|_| Error::Disconnected)?;
        if let Some(owner) = self.owner.take() {
            let _ = owner.join();
        }
        if let Some(ticker) = self.ticker.take() {
            let _ = ticker.join();
        }
        Ok(())
    }
}

struct OwnerState {
    root: PathBuf,
    options: EngineOptions,
    data_path: PathBuf,
    buckets_path: PathBuf,
    directory: Directory,
    rawfiles: Vec<PathBuf>,
    buffer: Vec<Record>,
    last_merge_time: Instant,
    is_merging: bool,
    thread_pool: ThreadPool,
    mailbox: Sender<EngineCommand>,
    rx: Receiver<EngineCommand>,
}

fn run_owner(mut state: OwnerState) {
    while let Ok(command) = state.rx.recv() {
        match command {
            EngineCommand::Put(record) => state.buffer.push(record),
            EngineCommand::Stream { bucket, sink, correlation } => {
                if let Err(e) = reader::stream(
                    &state.data_path,
                    &state.directory,
                    &bucket,
                    &sink,
                    correlation,
                    state.options.max_frame_size(),
                ) {
                    log::error!("stream failed for a bucket: {e}");
                }
            }
            EngineCommand::Checkpoint => checkpoint(&mut state),
            EngineCommand::MergeComplete { directory, consumed_rawfiles } => {
                merge_complete(&mut state, directory, consumed_rawfiles)
            }
            EngineCommand::Shutdown => break,
        }
    }
    state.thread_pool.shutdown();
    let _ = state.thread_pool.join();
}

fn checkpoint(state: &mut OwnerState) {
    if !state.buffer.is_empty() {
        let buffered = std::mem::take(&mut state.buffer);
        match rawfile::flush(&state.root, &buffered, state.options.rawfile_buffer_bytes()) {
            Ok(Some(path)) => state.rawfiles.push(path),
            Ok(None) => {}
            Err(e) => log::error!("failed to flush write buffer to a rawfile: {e}"),
        }
    }

    if !state.is_merging && state.last_merge_time.elapsed() > state.options.merge_interval() {
        launch_merge(state);
    }
}

/// Snapshots the pending rawfiles and hands a [`MergeCommand`] to the
/// background thread pool. The rawfiles list is cleared immediately so
/// flushes that happen while this merge runs start a fresh snapshot for the
/// *next* one (§4.6, §9 open question 2).
fn launch_merge(state: &mut OwnerState) {
    let snapshot = std::mem::take(&mut state.rawfiles);
    log::info!("launching background merge over {} rawfile(s)", snapshot.len());
    state.is_merging = true;

    let command = MergeCommand {
        old_data_path: state.data_path.clone(),
        rawfiles: snapshot,
        rawmerged_path: suffixed(&state.root, ".rawmerged"),
        merged_path: suffixed(&state.root, ".merged"),
        buckets_merged_path: suffixed(&state.root, ".buckets_merged"),
        max_frame_size: state.options.max_frame_size(),
        buffer_bytes: state.options.data_file_buffer_bytes(),
        mailbox: state.mailbox.clone(),
    };
    state.thread_pool.submit(Box::new(command));
}

fn merge_complete(state: &mut OwnerState, directory: Directory, consumed_rawfiles: Vec<PathBuf>) {
    let merged_path = suffixed(&state.root, ".merged");
    let buckets_merged_path = suffixed(&state.root, ".buckets_merged");

    if let Err(e) = crate::swap::install(&merged_path, &state.data_path) {
        log::error!("failed to install merged data file: {e}");
        return;
    }
    if let Err(e) = crate::swap::install(&buckets_merged_path, &state.buckets_path) {
        log::error!("failed to install merged bucket directory: {e}");
        return;
    }

    state.directory = directory;
    for path in &consumed_rawfiles {
        let _ = std::fs::remove_file(path);
    }
    state.last_merge_time = Instant::now();
    state.is_merging = false;
    log::info!("merge complete, consumed {} rawfile(s)", consumed_rawfiles.len());
}

/// One background merge cycle, submitted to the `command_executor` thread
/// pool. On success it posts `MergeComplete` back through the mailbox; on
/// failure it only logs — per §7/§9, the worker "terminates without posting
/// `merge_complete`", leaving `is_merging` set until a restart's recovery
/// scan repopulates the pending rawfiles list.
struct MergeCommand {
    old_data_path: PathBuf,
    rawfiles: Vec<PathBuf>,
    rawmerged_path: PathBuf,
    merged_path: PathBuf,
    buckets_merged_path: PathBuf,
    max_frame_size: u32,
    buffer_bytes: usize,
    mailbox: Sender<EngineCommand>,
}

impl Command for MergeCommand {
    fn execute(&self) -> std::result::Result<(), anyhow::Error> {
        match merge::run_merge(
            &self.old_data_path,
            &self.rawfiles,
            &self.rawmerged_path,
            &self.merged_path,
            &self.buckets_merged_path,
            self.max_frame_size,
            self.buffer_bytes,
        ) {
            Ok(directory) => {
                let _ = self.mailbox.send(EngineCommand::MergeComplete {
                    directory,
                    consumed_rawfiles: self.rawfiles.clone(),
                });
            }
            Err(e) => log::error!("background merge failed, is_merging remains set until restart: {e}"),
        }
        Ok(())
    }
}

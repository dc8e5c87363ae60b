use std::time::Duration;

/// Tunable knobs for an [`crate::engine::EngineHandle`].
///
/// A private, fully populated struct with getters, built through an options
/// type with `with_*` setters rather than a constructor with a dozen
/// positional arguments.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    merge_interval: Duration,
    checkpoint_interval: Duration,
    rawfile_buffer_bytes: usize,
    data_file_buffer_bytes: usize,
    max_frame_size: u32,
}

impl Default for EngineOptions {
    /// Defaults: a 10s merge interval, a 100ms checkpoint
    /// tick, a 500 KiB rawfile write buffer and a 2 MiB data-file write
    /// buffer.
    fn default() -> EngineOptions {
        EngineOptions {
            merge_interval: Duration::from_secs(10),
            checkpoint_interval: Duration::from_millis(100),
            rawfile_buffer_bytes: 500 * 1024,
            data_file_buffer_bytes: 2 * 1024 * 1024,
            max_frame_size: 64 * 1024 * 1024,
        }
    }
}

impl EngineOptions {
    pub fn new() -> EngineOptions {
        EngineOptions::default()
    }

    /// How long to wait between background merges. The default is 10s.
    pub fn with_merge_interval(mut self, merge_interval: Duration) -> EngineOptions {
        self.merge_interval = merge_interval;
        self
    }

    /// How often the owner checks the buffer for a pending flush. The
    /// default is 100ms.
    pub fn with_checkpoint_interval(mut self, checkpoint_interval: Duration) -> EngineOptions {
        self.checkpoint_interval = checkpoint_interval;
        self
    }

    /// Buffered writer capacity used when flushing a rawfile.
    pub fn with_rawfile_buffer_bytes(mut self, rawfile_buffer_bytes: usize) -> EngineOptions {
        self.rawfile_buffer_bytes = rawfile_buffer_bytes;
        self
    }

    /// Buffered writer capacity used when writing the merged data file.
    pub fn with_data_file_buffer_bytes(mut self, data_file_buffer_bytes: usize) -> EngineOptions {
        self.data_file_buffer_bytes = data_file_buffer_bytes;
        self
    }

    /// Reject frames whose length prefix exceeds this many bytes.
    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> EngineOptions {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn merge_interval(&self) -> Duration {
        self.merge_interval
    }

    pub fn checkpoint_interval(&self) -> Duration {
        self.checkpoint_interval
    }

    pub fn rawfile_buffer_bytes(&self) -> usize {
        self.rawfile_buffer_bytes
    }

    pub fn data_file_buffer_bytes(&self) -> usize {
        self.data_file_buffer_bytes
    }

    pub fn max_frame_size(&self) -> u32 {
        self.max_frame_size
    }
}

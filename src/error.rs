use std::path::PathBuf;

/// Errors surfaced at the engine's public API boundary.
///
/// `command_executor::command::Command::execute` still returns
/// `anyhow::Error` (that's the thread pool's own error type), so the
/// background merge task converts its `Result<Directory, Error>` into a log
/// line rather than propagating it — see `engine::MergeCommand::execute`.
/// Every other path converts straight to this enum so callers can match on
/// the kind instead of inspecting a message string.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupted data at {path}: {reason}")]
    Corruption { path: PathBuf, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("engine mailbox is closed")]
    Disconnected,
}

impl Error {
    pub(crate) fn corruption(path: impl Into<PathBuf>, reason: impl Into<String>) -> Error {
        Error::Corruption {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Rejected at construction; never recoverable
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A blocked produce/consume was cancelled; queue state is untouched
    #[error("Interrupted while waiting on queue")]
    Interrupted,
}

pub type Result<T> = std::result::Result<T, QueueError>;

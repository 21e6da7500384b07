//! Error types for `BlockList`.

use thiserror::Error as ThisError;

/// The error type for fallible `BlockList` operations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum BlockListError {
    /// A construction parameter was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A single logical index was past the end of the list.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// A `start..start + length` range did not fit inside the list.
    #[error("range {start}..{start}+{length} out of bounds for list of length {len}")]
    RangeOutOfBounds {
        start: usize,
        length: usize,
        len: usize,
    },

    /// The destination of a range copy cannot hold the requested elements.
    #[error("destination holds {available} elements but {required} were requested")]
    BufferTooSmall { required: usize, available: usize },

    /// `pop` was called on an empty list.
    #[error("list is empty")]
    Empty,

    /// Allocating a new block failed. The list was left unchanged.
    #[error("failed to allocate a block of {block_capacity} elements")]
    AllocFailed { block_capacity: usize },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlockListError>;

use thiserror::Error;

use super::types::{PageId, SlotId};

/// Database error types
#[derive(Error, Debug)]
pub enum SlotDbError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Buffer pool
    #[error("Buffer pool is full, no unpinned frames available")]
    BufferPoolFull,

    #[error("Page {0} is not resident in the buffer pool")]
    PageNotFound(PageId),

    // Disk manager
    #[error("Page {0} does not exist on disk")]
    PageDoesNotExist(PageId),

    #[error("Incomplete read of page {page_id}: got {read} bytes")]
    IncompleteRead { page_id: PageId, read: usize },

    #[error("Page data size {actual} does not match page size {expected}")]
    InvalidPageDataSize { expected: usize, actual: usize },

    // Slotted page
    #[error("Not enough space: need {required} bytes, {available} available")]
    NotEnoughSpace { required: usize, available: usize },

    #[error("Tuple of {size} bytes exceeds the maximum of {max} bytes")]
    TupleTooLarge { size: usize, max: usize },

    #[error("Empty tuples cannot be stored")]
    EmptyTuple,

    #[error("Slot {0} does not exist")]
    SlotNotFound(SlotId),

    #[error("Tuple in slot {0} has been deleted")]
    TupleDeleted(SlotId),

    #[error("Slot {0} points outside the tuple data area")]
    CorruptSlot(SlotId),

    // Table heap
    #[error("Page {0} cannot be addressed by a 16-bit page link")]
    PageIdOutOfRange(PageId),

    #[error("Page chain revisits {0}")]
    PageChainCycle(PageId),

    // Tuple codec
    #[error("Expected {expected} values, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    #[error("Column '{column}' expects {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Column '{column}' holds {len} bytes, maximum is {max}")]
    StringTooLong {
        column: String,
        len: usize,
        max: usize,
    },

    #[error("Tuple is truncated at column '{0}'")]
    TruncatedTuple(String),

    #[error("Column '{0}' is not valid UTF-8")]
    InvalidUtf8(String),

    #[error("Tuple has {0} trailing bytes after the last column")]
    TrailingBytes(usize),
}

pub type Result<T> = std::result::Result<T, SlotDbError>;

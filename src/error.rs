use thiserror::Error;

use crate::SlotNumber;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store has not been initialized")]
    NotInitialized,
    #[error("Invalid capacity {capacity}: {reason}")]
    InvalidCapacity { capacity: usize, reason: &'static str },
    #[error("Invalid key length {0}")]
    InvalidKeyLength(usize),
    #[error("Key {key:?} has length {actual}, expected {expected}")]
    KeyLengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },
    #[error("Key {0:?} is already present")]
    DuplicateKey(String),
    #[error("{what} {value} is outside 1..={max}")]
    OutOfRange {
        what: &'static str,
        value: usize,
        max: usize,
    },
    #[error("Slot {0} is already occupied")]
    SlotOccupied(SlotNumber),
    #[error("Store is full ({0} slots)")]
    Full(usize),
    #[error("No free slot found after {probes} probes from slot {origin}")]
    TableFull { origin: SlotNumber, probes: usize },
    #[error("No digits extracted from key {0:?}")]
    ExtractionEmpty(String),
    #[error("Store is not sorted")]
    NotSorted,
    #[error("Key {0:?} is not numeric")]
    MalformedKey(String),
    #[error("Hashed placement was discarded by sort; initialize the store again")]
    Compacted,
}

pub type Result<T> = std::result::Result<T, StoreError>;

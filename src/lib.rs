pub mod address;
pub mod console;
pub mod error;
pub mod hash;
pub mod key;
pub mod options;
pub mod probe;
pub mod search;
pub mod store;

pub use crate::address::{AddressSpace, BlockLocation, BlockedSpace, FlatSpace};
pub use crate::error::{Result, StoreError};
pub use crate::hash::HashFunction;
pub use crate::key::{Key, KeyOrder};
pub use crate::probe::CollisionResolver;
pub use crate::search::{SearchMethod, SearchOutcome, TraceStep};
pub use crate::store::{SlotStore, StoreStats};

/// 1-based slot index, as seen by callers.
pub type SlotNumber = usize;

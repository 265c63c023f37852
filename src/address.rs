use std::{fmt, ops::RangeInclusive};

use crate::{
    error::{Result, StoreError},
    key::Key,
    SlotNumber,
};

// A blocked space needs room for at least two blocks of two.
pub const MIN_BLOCKED_CAPACITY: usize = 4;

/// Maps 1-based slot numbers onto physical storage.
pub trait AddressSpace {
    type Location: Copy + fmt::Debug + PartialEq;

    /// Number of addressable slots.
    fn capacity(&self) -> usize;

    fn to_location(&self, slot: SlotNumber) -> Result<Self::Location>;
    fn from_location(&self, location: Self::Location) -> SlotNumber;

    fn get(&self, location: Self::Location) -> Option<&Key>;
    /// Stores `key` at `location`, returning what was there before.
    fn set(&mut self, location: Self::Location, key: Option<Key>) -> Option<Key>;
    fn clear(&mut self);
    /// Every slot in address order, starting at slot 1.
    fn iter(&self) -> Box<dyn Iterator<Item = Option<&Key>> + '_>;

    fn num_blocks(&self) -> usize;
    fn block_range(&self, block: usize) -> Result<RangeInclusive<SlotNumber>>;

    fn is_occupied(&self, location: Self::Location) -> bool {
        self.get(location).is_some()
    }

    fn slot(&self, slot: SlotNumber) -> Result<Option<&Key>> {
        let location = self.to_location(slot)?;
        Ok(self.get(location))
    }

    fn is_slot_occupied(&self, slot: SlotNumber) -> Result<bool> {
        let location = self.to_location(slot)?;
        Ok(self.is_occupied(location))
    }

    fn put(&mut self, slot: SlotNumber, key: Option<Key>) -> Result<Option<Key>> {
        let location = self.to_location(slot)?;
        Ok(self.set(location, key))
    }
}

fn check_slot(slot: SlotNumber, capacity: usize) -> Result<()> {
    if slot == 0 || slot > capacity {
        return Err(StoreError::OutOfRange {
            what: "slot",
            value: slot,
            max: capacity,
        });
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct FlatSpace {
    slots: Vec<Option<Key>>,
}

impl FlatSpace {
    pub fn new(capacity: usize) -> Result<FlatSpace> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity {
                capacity,
                reason: "a store needs at least one slot",
            });
        }
        Ok(FlatSpace {
            slots: vec![None; capacity],
        })
    }
}

impl AddressSpace for FlatSpace {
    type Location = usize;

    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn to_location(&self, slot: SlotNumber) -> Result<usize> {
        check_slot(slot, self.capacity())?;
        Ok(slot - 1)
    }

    fn from_location(&self, location: usize) -> SlotNumber {
        location + 1
    }

    fn get(&self, location: usize) -> Option<&Key> {
        self.slots[location].as_ref()
    }

    fn set(&mut self, location: usize, key: Option<Key>) -> Option<Key> {
        std::mem::replace(&mut self.slots[location], key)
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = Option<&Key>> + '_> {
        Box::new(self.slots.iter().map(Option::as_ref))
    }

    fn num_blocks(&self) -> usize {
        1
    }

    fn block_range(&self, block: usize) -> Result<RangeInclusive<SlotNumber>> {
        if block != 0 {
            return Err(StoreError::OutOfRange {
                what: "block",
                value: block + 1,
                max: 1,
            });
        }
        Ok(1..=self.capacity())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    pub block: usize,
    pub offset: usize,
}

impl fmt::Display for BlockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {} offset {}", self.block, self.offset)
    }
}

/// Capacity split into `floor(sqrt(n))` equal blocks.
///
/// Block size is `n / num_blocks`; the remainder of that division is never
/// addressable, so `capacity()` can be smaller than the requested size.
#[derive(Debug, Clone)]
pub struct BlockedSpace {
    blocks: Vec<Vec<Option<Key>>>,
    elements_per_block: usize,
    requested: usize,
}

impl BlockedSpace {
    pub fn new(capacity: usize) -> Result<BlockedSpace> {
        if capacity < MIN_BLOCKED_CAPACITY {
            return Err(StoreError::InvalidCapacity {
                capacity,
                reason: "a blocked store needs at least 4 slots",
            });
        }
        let num_blocks = isqrt(capacity);
        let elements_per_block = capacity / num_blocks;
        Ok(BlockedSpace {
            blocks: vec![vec![None; elements_per_block]; num_blocks],
            elements_per_block,
            requested: capacity,
        })
    }

    pub fn elements_per_block(&self) -> usize {
        self.elements_per_block
    }

    /// The size asked for at construction, including any unaddressable tail.
    pub fn requested_capacity(&self) -> usize {
        self.requested
    }

    pub fn block_of(&self, slot: SlotNumber) -> Result<usize> {
        Ok(self.to_location(slot)?.block)
    }
}

impl AddressSpace for BlockedSpace {
    type Location = BlockLocation;

    fn capacity(&self) -> usize {
        self.blocks.len() * self.elements_per_block
    }

    fn to_location(&self, slot: SlotNumber) -> Result<BlockLocation> {
        check_slot(slot, self.capacity())?;
        Ok(BlockLocation {
            block: (slot - 1) / self.elements_per_block,
            offset: (slot - 1) % self.elements_per_block,
        })
    }

    fn from_location(&self, location: BlockLocation) -> SlotNumber {
        location.block * self.elements_per_block + location.offset + 1
    }

    fn get(&self, location: BlockLocation) -> Option<&Key> {
        self.blocks[location.block][location.offset].as_ref()
    }

    fn set(&mut self, location: BlockLocation, key: Option<Key>) -> Option<Key> {
        std::mem::replace(&mut self.blocks[location.block][location.offset], key)
    }

    fn clear(&mut self) {
        self.blocks.iter_mut().flatten().for_each(|s| *s = None);
    }

    fn iter(&self) -> Box<dyn Iterator<Item = Option<&Key>> + '_> {
        Box::new(self.blocks.iter().flatten().map(Option::as_ref))
    }

    fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    fn block_range(&self, block: usize) -> Result<RangeInclusive<SlotNumber>> {
        if block >= self.num_blocks() {
            return Err(StoreError::OutOfRange {
                what: "block",
                value: block + 1,
                max: self.num_blocks(),
            });
        }
        let first = block * self.elements_per_block + 1;
        Ok(first..=first + self.elements_per_block - 1)
    }
}

fn isqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

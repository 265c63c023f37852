use std::fmt;

use tracing::Level;

use crate::{
    address::{AddressSpace, BlockedSpace, FlatSpace},
    error::{Result, StoreError},
    hash::HashFunction,
    key::{Key, KeyOrder, MAX_KEY_LENGTH},
    probe::CollisionResolver,
    search::{self, SearchMethod, SearchOutcome},
    SlotNumber,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub accepted: usize,
    pub rejected: usize,
    // hashed inserts whose home slot was taken
    pub collisions: usize,
    // candidates examined by collision resolvers
    pub probes: usize,
    pub hits: usize,
    pub misses: usize,
}

impl StoreStats {
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.hits + self.misses)
    }

    pub fn acceptance_rate(&self) -> f64 {
        ratio(self.accepted, self.accepted + self.rejected)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hits: {}", self.hits)?;
        writeln!(f, "Misses: {}", self.misses)?;
        writeln!(f, "Hit Rate: {}", self.hit_rate())?;
        writeln!(f, "Accepted: {}", self.accepted)?;
        writeln!(f, "Rejected: {}", self.rejected)?;
        writeln!(f, "Acceptance Rate: {}", self.acceptance_rate())?;
        writeln!(f, "Collisions: {}", self.collisions)?;
        write!(f, "Probes: {}", self.probes)
    }
}

/// A fixed-capacity space of 1-based slots, each holding at most one key.
///
/// Keys are placed either sequentially (first empty slot, no duplicates) or
/// by hashing, in which case finding them again means replaying the same
/// hash function and collision resolver. A store must be initialized before
/// it accepts keys.
#[derive(Debug, Clone)]
pub struct SlotStore<A: AddressSpace = FlatSpace> {
    space: A,
    key_length: usize,
    initialized: bool,
    // set by sort(), which moves keys away from their hashed slots
    compacted: bool,
    stats: StoreStats,
}

impl SlotStore<FlatSpace> {
    pub fn new(capacity: usize, key_length: usize) -> Result<SlotStore<FlatSpace>> {
        SlotStore::with_space(FlatSpace::new(capacity)?, key_length)
    }
}

impl SlotStore<BlockedSpace> {
    pub fn blocked(capacity: usize, key_length: usize) -> Result<SlotStore<BlockedSpace>> {
        SlotStore::with_space(BlockedSpace::new(capacity)?, key_length)
    }
}

impl<A: AddressSpace> SlotStore<A> {
    pub fn with_space(space: A, key_length: usize) -> Result<SlotStore<A>> {
        if key_length == 0 || key_length > MAX_KEY_LENGTH {
            return Err(StoreError::InvalidKeyLength(key_length));
        }
        Ok(SlotStore {
            space,
            key_length,
            initialized: false,
            compacted: false,
            stats: StoreStats::default(),
        })
    }

    pub fn initialize(&mut self) {
        self.space.clear();
        self.initialized = true;
        self.compacted = false;
    }

    pub fn reset(&mut self) {
        self.space.clear();
        self.initialized = false;
        self.compacted = false;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn capacity(&self) -> usize {
        self.space.capacity()
    }

    pub fn key_length(&self) -> usize {
        self.key_length
    }

    pub fn space(&self) -> &A {
        &self.space
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = StoreStats::default();
    }

    pub fn get(&self, slot: SlotNumber) -> Result<Option<&Key>> {
        self.space.slot(slot)
    }

    /// Every slot in address order, empty or not.
    pub fn slots(&self) -> impl Iterator<Item = (SlotNumber, Option<&Key>)> + '_ {
        self.space.iter().enumerate().map(|(i, k)| (i + 1, k))
    }

    /// Occupied slots in address order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotNumber, &Key)> + '_ {
        self.slots().filter_map(|(slot, k)| k.map(|k| (slot, k)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        ratio(self.len(), self.capacity())
    }

    pub fn key_order(&self) -> KeyOrder {
        KeyOrder::for_keys(self.iter().map(|(_, k)| k))
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if !self.initialized {
            return Err(StoreError::NotInitialized);
        }
        Ok(())
    }

    pub(crate) fn ensure_hashable(&self) -> Result<()> {
        self.ensure_initialized()?;
        if self.compacted {
            return Err(StoreError::Compacted);
        }
        Ok(())
    }

    pub(crate) fn make_key(&self, key: &str) -> Result<Key> {
        Key::new(key, self.key_length)
    }

    fn position_of(&self, key: &Key) -> Option<SlotNumber> {
        self.iter().find(|(_, k)| *k == key).map(|(slot, _)| slot)
    }

    fn place(&mut self, slot: SlotNumber, key: Key) -> Result<SlotNumber> {
        self.space.put(slot, Some(key))?;
        self.stats.accepted += 1;
        Ok(slot)
    }

    fn reject<T>(&mut self, err: StoreError) -> Result<T> {
        self.stats.rejected += 1;
        tracing::event!(Level::DEBUG, error = %err, "Insert rejected");
        Err(err)
    }

    /// Puts `key` in the first empty slot, scanning in address order.
    pub fn insert(&mut self, key: &str) -> Result<SlotNumber> {
        self.ensure_initialized()?;
        let key = self.make_key(key)?;
        if self.position_of(&key).is_some() {
            return self.reject(StoreError::DuplicateKey(key.to_string()));
        }
        let free = self.slots().find(|(_, k)| k.is_none()).map(|(s, _)| s);
        let Some(slot) = free else {
            return self.reject(StoreError::Full(self.capacity()));
        };
        tracing::event!(Level::TRACE, key = %key, slot, "Inserted");
        self.place(slot, key)
    }

    /// Puts `key` at its hashed slot, or wherever `resolver` finds room.
    ///
    /// Duplicates are not checked: inserting a key twice occupies two slots,
    /// and only the first one on the probe path is ever found by lookup.
    pub fn insert_hashed(
        &mut self,
        key: &str,
        hash: &HashFunction,
        resolver: CollisionResolver,
    ) -> Result<SlotNumber> {
        self.ensure_hashable()?;
        let key = self.make_key(key)?;
        let origin = hash.slot_for(&key, self.capacity())?;
        if !self.space.is_slot_occupied(origin)? {
            tracing::event!(Level::TRACE, key = %key, %hash, slot = origin, "Inserted at home slot");
            return self.place(origin, key);
        }
        self.stats.collisions += 1;
        if self.is_full() {
            return self.reject(StoreError::Full(self.capacity()));
        }
        match resolver.resolve(origin, &self.space) {
            Ok(resolution) => {
                self.stats.probes += resolution.probes;
                tracing::event!(
                    Level::TRACE,
                    key = %key,
                    %hash,
                    %resolver,
                    origin,
                    slot = resolution.slot,
                    "Inserted after collision"
                );
                self.place(resolution.slot, key)
            }
            Err(err) => {
                if let StoreError::TableFull { probes, .. } = err {
                    self.stats.probes += probes;
                }
                self.reject(err)
            }
        }
    }

    pub fn insert_at(&mut self, key: &str, slot: SlotNumber) -> Result<()> {
        self.ensure_initialized()?;
        let key = self.make_key(key)?;
        if self.space.is_slot_occupied(slot)? {
            return self.reject(StoreError::SlotOccupied(slot));
        }
        self.place(slot, key)?;
        Ok(())
    }

    /// Removes the first slot holding `key`, scanning in address order.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        self.ensure_initialized()?;
        let key = self.make_key(key)?;
        match self.position_of(&key) {
            Some(slot) => {
                self.space.put(slot, None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes `key` from the slot its hashed lookup resolves to.
    ///
    /// The slot is left empty, so keys probed past it by the same resolver
    /// are no longer reachable through lookup.
    pub fn remove_hashed(
        &mut self,
        key: &str,
        hash: &HashFunction,
        resolver: CollisionResolver,
    ) -> Result<bool> {
        let outcome = search::hashed_lookup(self, key, hash, resolver)?;
        match outcome.slot {
            Some(slot) => {
                self.space.put(slot, None)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Orders every key and packs them into the front of the space.
    ///
    /// Keys leave their hashed slots, so hashed insert and lookup are refused
    /// until the store is initialized again.
    pub fn sort(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        let mut keys: Vec<Key> = self.iter().map(|(_, k)| k.clone()).collect();
        let order = KeyOrder::for_keys(&keys);
        keys.sort_by(|a, b| order.compare(a, b));
        self.space.clear();
        for (i, key) in keys.into_iter().enumerate() {
            self.space.put(i + 1, Some(key))?;
        }
        self.compacted = true;
        tracing::event!(Level::DEBUG, ?order, len = self.len(), "Sorted");
        Ok(())
    }

    /// Whether occupied slots are in non-decreasing order, ignoring gaps.
    pub fn is_sorted(&self) -> bool {
        let order = self.key_order();
        let keys: Vec<&Key> = self.iter().map(|(_, k)| k).collect();
        keys.windows(2).all(|w| order.compare(w[0], w[1]).is_le())
    }

    pub fn search(&mut self, key: &str, method: &SearchMethod) -> Result<SearchOutcome> {
        let outcome = match method {
            SearchMethod::Linear => search::linear_search(self, key)?,
            SearchMethod::Binary => search::binary_search(self, key)?,
            SearchMethod::BlockBinary => search::block_binary_search(self, key)?,
            SearchMethod::Hashed { hash, resolver } => {
                search::hashed_lookup(self, key, hash, *resolver)?
            }
        };
        if outcome.found() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        Ok(outcome)
    }

    /// Ordered `(slot, key)` pairs for every slot, for callers that persist the store.
    pub fn dump(&self) -> Vec<(SlotNumber, Option<Key>)> {
        self.slots().map(|(slot, k)| (slot, k.cloned())).collect()
    }

    /// Places each key of a dump back at its slot, returning how many were placed.
    ///
    /// Every entry is checked before any is placed: on error the store is
    /// left as it was.
    pub fn load<I>(&mut self, dump: I) -> Result<usize>
    where
        I: IntoIterator<Item = (SlotNumber, Option<Key>)>,
    {
        self.ensure_initialized()?;
        let mut staged: Vec<(SlotNumber, Key)> = Vec::new();
        for (slot, key) in dump {
            let Some(key) = key else {
                continue;
            };
            let key = self.make_key(key.as_str())?;
            if self.space.is_slot_occupied(slot)? || staged.iter().any(|(s, _)| *s == slot) {
                return self.reject(StoreError::SlotOccupied(slot));
            }
            staged.push((slot, key));
        }
        let placed = staged.len();
        for (slot, key) in staged {
            self.place(slot, key)?;
        }
        Ok(placed)
    }
}

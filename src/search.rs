use std::fmt;

use tracing::Level;

use crate::{
    address::AddressSpace,
    error::{Result, StoreError},
    hash::HashFunction,
    key::{Key, KeyOrder},
    probe::CollisionResolver,
    store::SlotStore,
    SlotNumber,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SearchMethod {
    Linear,
    Binary,
    // two phases: locate the block, then search inside it
    BlockBinary,
    Hashed {
        hash: HashFunction,
        resolver: CollisionResolver,
    },
}

/// One step of a search, kept so callers can count and explain comparisons.
///
/// `left` and `right` bound a half-open window over the occupied slots (or
/// over the non-empty blocks) still under consideration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStep {
    Compare {
        slot: SlotNumber,
        value: Option<Key>,
        matched: bool,
    },
    Narrow {
        left: usize,
        mid: usize,
        right: usize,
        slot: SlotNumber,
    },
    Block {
        left: usize,
        mid: usize,
        right: usize,
        block: usize,
    },
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceStep::Compare {
                slot,
                value,
                matched,
            } => {
                let value = value.as_ref().map_or("-", Key::as_str);
                let verdict = if *matched { "match" } else { "no match" };
                write!(f, "slot {slot}: {value} ({verdict})")
            }
            TraceStep::Narrow {
                left,
                mid,
                right,
                slot,
            } => write!(f, "left {left} mid {mid} right {right} -> slot {slot}"),
            TraceStep::Block {
                left,
                mid,
                right,
                block,
            } => write!(f, "left {left} mid {mid} right {right} -> block {block}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub slot: Option<SlotNumber>,
    pub trace: Vec<TraceStep>,
}

impl SearchOutcome {
    pub fn found(&self) -> bool {
        self.slot.is_some()
    }

    pub fn comparisons(&self) -> usize {
        self.trace.len()
    }
}

/// Walks every slot from slot 1, empty ones included, until `key` matches.
#[tracing::instrument(level = "debug", skip(store))]
pub fn linear_search<A: AddressSpace>(store: &SlotStore<A>, key: &str) -> Result<SearchOutcome> {
    store.ensure_initialized()?;
    let target = store.make_key(key)?;
    let mut trace = vec![];
    for (slot, value) in store.slots() {
        let matched = value == Some(&target);
        trace.push(TraceStep::Compare {
            slot,
            value: value.cloned(),
            matched,
        });
        if matched {
            return Ok(SearchOutcome {
                slot: Some(slot),
                trace,
            });
        }
    }
    Ok(SearchOutcome { slot: None, trace })
}

fn search_order<A: AddressSpace>(store: &SlotStore<A>, target: &Key) -> KeyOrder {
    KeyOrder::for_keys(store.iter().map(|(_, k)| k).chain(std::iter::once(target)))
}

fn narrow(
    entries: &[(SlotNumber, &Key)],
    target: &Key,
    order: KeyOrder,
    trace: &mut Vec<TraceStep>,
) -> Option<SlotNumber> {
    let (mut left, mut right) = (0, entries.len());
    while left < right {
        let mid = left + (right - left) / 2;
        let (slot, candidate) = entries[mid];
        trace.push(TraceStep::Narrow {
            left,
            mid,
            right,
            slot,
        });
        match order.compare(target, candidate) {
            std::cmp::Ordering::Equal => return Some(slot),
            std::cmp::Ordering::Less => right = mid,
            std::cmp::Ordering::Greater => left = mid + 1,
        }
    }
    None
}

/// Binary search over the occupied slots of a sorted store.
///
/// Fails with `NotSorted` rather than sorting on the caller's behalf.
#[tracing::instrument(level = "debug", skip(store))]
pub fn binary_search<A: AddressSpace>(store: &SlotStore<A>, key: &str) -> Result<SearchOutcome> {
    store.ensure_initialized()?;
    let target = store.make_key(key)?;
    if !store.is_sorted() {
        return Err(StoreError::NotSorted);
    }
    let order = search_order(store, &target);
    let entries: Vec<(SlotNumber, &Key)> = store.iter().collect();
    let mut trace = vec![];
    let slot = narrow(&entries, &target, order, &mut trace);
    Ok(SearchOutcome { slot, trace })
}

/// Finds the block whose first and last keys bracket `key`, then searches it.
///
/// Empty blocks take no part in the first phase. A key outside every block's
/// bounds is reported missing without entering the second phase.
#[tracing::instrument(level = "debug", skip(store))]
pub fn block_binary_search<A: AddressSpace>(
    store: &SlotStore<A>,
    key: &str,
) -> Result<SearchOutcome> {
    store.ensure_initialized()?;
    let target = store.make_key(key)?;
    if !store.is_sorted() {
        return Err(StoreError::NotSorted);
    }
    let order = search_order(store, &target);
    let occupied: Vec<(SlotNumber, &Key)> = store.iter().collect();

    let space = store.space();
    let mut blocks: Vec<(usize, &[(SlotNumber, &Key)])> = vec![];
    let mut start = 0;
    for block in 0..space.num_blocks() {
        let range = space.block_range(block)?;
        let len = occupied[start..]
            .iter()
            .take_while(|(slot, _)| range.contains(slot))
            .count();
        if len > 0 {
            blocks.push((block, &occupied[start..start + len]));
        }
        start += len;
    }

    let mut trace = vec![];
    let mut located = None;
    let (mut left, mut right) = (0, blocks.len());
    while left < right {
        let mid = left + (right - left) / 2;
        let (block, entries) = blocks[mid];
        trace.push(TraceStep::Block {
            left,
            mid,
            right,
            block,
        });
        let (first, last) = (entries[0].1, entries[entries.len() - 1].1);
        if order.compare(&target, first).is_lt() {
            right = mid;
        } else if order.compare(&target, last).is_gt() {
            left = mid + 1;
        } else {
            located = Some(entries);
            break;
        }
    }
    let Some(entries) = located else {
        tracing::event!(Level::DEBUG, "No block brackets key");
        return Ok(SearchOutcome { slot: None, trace });
    };
    let slot = narrow(entries, &target, order, &mut trace);
    Ok(SearchOutcome { slot, trace })
}

/// Replays the placement of `key`: its hashed slot, then the resolver's probes.
///
/// Stops at the first match, the first empty slot, or when the resolver runs
/// out of candidates.
#[tracing::instrument(level = "debug", skip(store))]
pub fn hashed_lookup<A: AddressSpace>(
    store: &SlotStore<A>,
    key: &str,
    hash: &HashFunction,
    resolver: CollisionResolver,
) -> Result<SearchOutcome> {
    store.ensure_hashable()?;
    let target = store.make_key(key)?;
    let origin = hash.slot_for(&target, store.capacity())?;
    let mut trace = vec![];
    for slot in std::iter::once(origin).chain(resolver.probes(origin, store.capacity())) {
        let value = store.get(slot)?;
        let matched = value == Some(&target);
        trace.push(TraceStep::Compare {
            slot,
            value: value.cloned(),
            matched,
        });
        if matched {
            return Ok(SearchOutcome {
                slot: Some(slot),
                trace,
            });
        }
        if value.is_none() {
            break;
        }
    }
    Ok(SearchOutcome { slot: None, trace })
}

#[cfg(test)]
mod tests {
    use crate::address::BlockedSpace;
    use crate::search::*;
    use proptest::prelude::*;

    fn store_with(slots: &[Option<&str>]) -> SlotStore {
        let mut s = SlotStore::new(slots.len(), 2).unwrap();
        s.initialize();
        for (i, k) in slots.iter().enumerate() {
            if let Some(k) = k {
                s.insert_at(k, i + 1).unwrap();
            }
        }
        s
    }

    fn blocked_with(capacity: usize, keys: &[&str]) -> SlotStore<BlockedSpace> {
        let mut s = SlotStore::blocked(capacity, 2).unwrap();
        s.initialize();
        for k in keys {
            s.insert(k).unwrap();
        }
        s
    }

    #[test]
    fn linear_counts_every_slot() {
        let s = store_with(&[None, Some("30"), Some("10"), None, Some("20")]);
        let outcome = linear_search(&s, "20").unwrap();
        assert!(outcome.found());
        assert_eq!(outcome.slot, Some(5));
        assert_eq!(outcome.comparisons(), 5);
        assert_eq!(
            outcome.trace[1],
            TraceStep::Compare {
                slot: 2,
                value: Some(Key::new("30", 2).unwrap()),
                matched: false
            }
        );
        assert_eq!(outcome.trace[4].to_string(), "slot 5: 20 (match)");
    }

    #[test]
    fn linear_miss_visits_everything() {
        let s = store_with(&[None, Some("30"), Some("10")]);
        let outcome = linear_search(&s, "99").unwrap();
        assert!(!outcome.found());
        assert_eq!(outcome.comparisons(), 3);
    }

    #[test]
    fn searches_need_initialized_store() {
        let s = SlotStore::new(4, 2).unwrap();
        assert_eq!(linear_search(&s, "10"), Err(StoreError::NotInitialized));
        assert_eq!(binary_search(&s, "10"), Err(StoreError::NotInitialized));
    }

    #[test]
    fn binary_requires_sorted() {
        let s = store_with(&[None, Some("30"), Some("10"), None, Some("20")]);
        let before = s.dump();
        assert_eq!(binary_search(&s, "20"), Err(StoreError::NotSorted));
        assert_eq!(block_binary_search(&s, "20"), Err(StoreError::NotSorted));
        assert_eq!(s.dump(), before);
    }

    #[test]
    fn binary_skips_gaps() {
        let s = store_with(&[
            None,
            Some("10"),
            None,
            Some("20"),
            Some("30"),
            None,
            Some("40"),
        ]);
        let outcome = binary_search(&s, "40").unwrap();
        assert_eq!(outcome.slot, Some(7));
        assert_eq!(
            outcome.trace,
            vec![
                TraceStep::Narrow {
                    left: 0,
                    mid: 2,
                    right: 4,
                    slot: 5
                },
                TraceStep::Narrow {
                    left: 3,
                    mid: 3,
                    right: 4,
                    slot: 7
                },
            ]
        );
        let outcome = binary_search(&s, "25").unwrap();
        assert!(!outcome.found());
        assert_eq!(binary_search(&s, "10").unwrap().slot, Some(2));
    }

    #[test]
    fn binary_on_empty_store() {
        let s = store_with(&[None, None]);
        let outcome = binary_search(&s, "10").unwrap();
        assert!(!outcome.found());
        assert_eq!(outcome.comparisons(), 0);
    }

    #[test]
    fn block_search_finds_key_in_block() {
        let mut s = blocked_with(9, &["70", "10", "50", "30", "90", "20", "60"]);
        s.sort().unwrap();
        // blocks: [10 20 30] [50 60 70] [90 - -]
        let outcome = block_binary_search(&s, "60").unwrap();
        assert_eq!(outcome.slot, Some(5));
        assert_eq!(
            outcome.trace[0],
            TraceStep::Block {
                left: 0,
                mid: 1,
                right: 3,
                block: 1
            }
        );
        assert_eq!(block_binary_search(&s, "90").unwrap().slot, Some(7));
        assert_eq!(block_binary_search(&s, "10").unwrap().slot, Some(1));
    }

    #[test]
    fn block_search_misses_without_second_phase() {
        let mut s = blocked_with(9, &["10", "20", "30", "50", "60"]);
        s.sort().unwrap();
        let outcome = block_binary_search(&s, "99").unwrap();
        assert!(!outcome.found());
        assert!(outcome
            .trace
            .iter()
            .all(|step| matches!(step, TraceStep::Block { .. })));
        // 40 falls between blocks 0 and 1
        let outcome = block_binary_search(&s, "40").unwrap();
        assert!(!outcome.found());
        assert!(outcome
            .trace
            .iter()
            .all(|step| matches!(step, TraceStep::Block { .. })));
    }

    #[test]
    fn block_search_inside_bracket_miss() {
        let mut s = blocked_with(9, &["10", "20", "30", "50", "60"]);
        s.sort().unwrap();
        // 15 is bracketed by block 0 but absent
        let outcome = block_binary_search(&s, "15").unwrap();
        assert!(!outcome.found());
        assert!(outcome
            .trace
            .iter()
            .any(|step| matches!(step, TraceStep::Narrow { .. })));
    }

    #[test]
    fn hashed_lookup_stops_at_empty() {
        let mut s = store_with(&[None; 10]);
        let hash = HashFunction::Modulo;
        s.insert_hashed("05", &hash, CollisionResolver::LinearProbing)
            .unwrap();
        let outcome = hashed_lookup(&s, "25", &hash, CollisionResolver::LinearProbing).unwrap();
        assert!(!outcome.found());
        // slot 6 holds 05, slot 7 is empty
        assert_eq!(outcome.comparisons(), 2);
    }

    #[test]
    fn hashed_lookup_after_sort_refused() {
        let mut s = store_with(&[None; 4]);
        s.insert_hashed("01", &HashFunction::Modulo, CollisionResolver::LinearProbing)
            .unwrap();
        s.sort().unwrap();
        assert_eq!(
            hashed_lookup(&s, "01", &HashFunction::Modulo, CollisionResolver::LinearProbing),
            Err(StoreError::Compacted)
        );
    }

    #[test]
    fn truncation_round_trip() {
        let mut s = SlotStore::new(1000, 8).unwrap();
        s.initialize();
        let hash = HashFunction::digit_truncation(vec![1, 4, 7], 8).unwrap();
        let resolver = CollisionResolver::SequentialDisplacement;
        assert_eq!(s.insert_hashed("10203040", &hash, resolver), Ok(105));
        assert_eq!(s.insert_hashed("25303540", &hash, resolver), Ok(206));
        assert_eq!(s.insert_hashed("50153028", &hash, resolver), Ok(551));
        // extracts "104" like the first key
        assert_eq!(s.insert_hashed("19503741", &hash, resolver), Ok(106));
        // extracts "105", whose home slot is now taken
        assert_eq!(s.insert_hashed("19203758", &hash, resolver), Ok(107));
        let method = SearchMethod::Hashed { hash, resolver };
        let outcome = s.search("19203758", &method).unwrap();
        assert_eq!(outcome.slot, Some(107));
        assert_eq!(outcome.comparisons(), 2);
        assert_eq!(s.search("19503741", &method).unwrap().slot, Some(106));
        assert_eq!(s.search("50153028", &method).unwrap().slot, Some(551));
    }

    fn distinct_keys() -> impl Strategy<Value = Vec<String>> {
        prop::collection::hash_set(0u32..10_000, 1..30)
            .prop_map(|keys| keys.into_iter().map(|k| format!("{k:04}")).collect())
    }

    fn resolvers() -> impl Strategy<Value = CollisionResolver> {
        prop_oneof![
            Just(CollisionResolver::LinearProbing),
            Just(CollisionResolver::QuadraticProbing),
            Just(CollisionResolver::SequentialDisplacement),
        ]
    }

    fn hashes() -> impl Strategy<Value = HashFunction> {
        prop_oneof![
            Just(HashFunction::Modulo),
            Just(HashFunction::MidSquare),
            Just(HashFunction::DigitTruncation {
                positions: vec![2, 4]
            }),
        ]
    }

    proptest! {
        #[test]
        fn prop_sequential_round_trip(keys in distinct_keys()) {
            let mut s = SlotStore::new(32, 4).unwrap();
            s.initialize();
            for k in &keys {
                let slot = s.insert(k).unwrap();
                let outcome = linear_search(&s, k).unwrap();
                prop_assert_eq!(outcome.slot, Some(slot));
                prop_assert_eq!(outcome.comparisons(), slot);
            }
        }

        #[test]
        fn prop_hashed_round_trip(keys in distinct_keys(), hash in hashes(), resolver in resolvers()) {
            let mut s = SlotStore::new(37, 4).unwrap();
            s.initialize();
            let mut placed = vec![];
            for k in &keys {
                if let Ok(slot) = s.insert_hashed(k, &hash, resolver) {
                    placed.push((k.clone(), slot));
                }
            }
            for (k, slot) in placed {
                let outcome = hashed_lookup(&s, &k, &hash, resolver).unwrap();
                prop_assert_eq!(outcome.slot, Some(slot));
            }
        }

        #[test]
        fn prop_capacity_bound(keys in prop::collection::hash_set(0u32..100, 10..40)) {
            let mut s = SlotStore::new(8, 2).unwrap();
            s.initialize();
            let mut accepted = 0;
            for k in &keys {
                match s.insert(&format!("{k:02}")) {
                    Ok(_) => accepted += 1,
                    Err(err) => prop_assert_eq!(err, StoreError::Full(8)),
                }
            }
            prop_assert_eq!(accepted, 8);
            prop_assert!(s.is_full());
        }

        #[test]
        fn prop_sorted_searches_agree(keys in distinct_keys()) {
            let mut flat = SlotStore::new(30, 4).unwrap();
            let mut blocked = SlotStore::blocked(36, 4).unwrap();
            flat.initialize();
            blocked.initialize();
            for k in &keys {
                flat.insert(k).unwrap();
                blocked.insert(k).unwrap();
            }
            flat.sort().unwrap();
            blocked.sort().unwrap();
            let once = flat.dump();
            flat.sort().unwrap();
            prop_assert_eq!(flat.dump(), once);
            prop_assert!(flat.is_sorted());
            for k in &keys {
                let linear = linear_search(&flat, k).unwrap().slot;
                prop_assert!(linear.is_some());
                prop_assert_eq!(binary_search(&flat, k).unwrap().slot, linear);
                prop_assert_eq!(block_binary_search(&blocked, k).unwrap().slot, linear);
            }
        }
    }
}

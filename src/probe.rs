use std::fmt;

use crate::{
    address::AddressSpace,
    error::{Result, StoreError},
    SlotNumber,
};

/// How a hashed insert finds a home when its computed slot is taken.
///
/// The "nested" and "linked" strategy names are presentation aliases of
/// `SequentialDisplacement`; they share its probe order exactly.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CollisionResolver {
    LinearProbing,
    // Does not reach every slot when the capacity is composite.
    QuadraticProbing,
    SequentialDisplacement,
}

impl CollisionResolver {
    pub fn from_label(label: &str) -> Option<CollisionResolver> {
        match label.to_ascii_lowercase().as_str() {
            "linear" | "linear-probing" => Some(CollisionResolver::LinearProbing),
            "quadratic" | "quadratic-probing" => Some(CollisionResolver::QuadraticProbing),
            "sequential" | "nested" | "linked" => Some(CollisionResolver::SequentialDisplacement),
            _ => None,
        }
    }

    /// Most candidates this strategy visits before giving up.
    pub fn max_probes(&self, capacity: usize) -> usize {
        match self {
            CollisionResolver::LinearProbing | CollisionResolver::SequentialDisplacement => {
                capacity.saturating_sub(1)
            }
            CollisionResolver::QuadraticProbing => capacity,
        }
    }

    /// Candidate slots after `origin`, in the order both insert and lookup visit them.
    pub fn probes(&self, origin: SlotNumber, capacity: usize) -> ProbeSequence {
        ProbeSequence {
            resolver: *self,
            origin,
            current: origin,
            attempt: 0,
            capacity,
            limit: self.max_probes(capacity),
        }
    }

    /// First free slot in the probe sequence from an occupied `origin`.
    pub fn resolve<A: AddressSpace>(&self, origin: SlotNumber, space: &A) -> Result<Resolution> {
        let mut probes = 0;
        for candidate in self.probes(origin, space.capacity()) {
            probes += 1;
            if !space.is_slot_occupied(candidate)? {
                tracing::event!(
                    tracing::Level::TRACE,
                    resolver = %self,
                    origin,
                    slot = candidate,
                    probes,
                    "Resolved collision"
                );
                return Ok(Resolution {
                    slot: candidate,
                    probes,
                });
            }
        }
        tracing::event!(tracing::Level::DEBUG, resolver = %self, origin, probes, "Probes exhausted");
        Err(StoreError::TableFull { origin, probes })
    }
}

impl fmt::Display for CollisionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CollisionResolver::LinearProbing => "linear",
                CollisionResolver::QuadraticProbing => "quadratic",
                CollisionResolver::SequentialDisplacement => "sequential",
            }
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub slot: SlotNumber,
    // candidates examined, including the one returned
    pub probes: usize,
}

/// Bounded, circular walk over `1..=capacity` starting after an origin slot.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    resolver: CollisionResolver,
    origin: SlotNumber,
    current: SlotNumber,
    attempt: usize,
    capacity: usize,
    limit: usize,
}

impl Iterator for ProbeSequence {
    type Item = SlotNumber;

    fn next(&mut self) -> Option<SlotNumber> {
        if self.attempt >= self.limit {
            return None;
        }
        self.attempt += 1;
        let cap = self.capacity;
        let next = match self.resolver {
            // step from the previous candidate, wrapping to slot 1
            CollisionResolver::LinearProbing => self.current % cap + 1,
            CollisionResolver::QuadraticProbing => {
                let i = (self.attempt % cap) as u128;
                ((self.origin - 1) as u128 + i * i) as usize % cap + 1
            }
            // fixed offset from the origin
            CollisionResolver::SequentialDisplacement => (self.origin - 1 + self.attempt) % cap + 1,
        };
        self.current = next;
        Some(next)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.limit - self.attempt;
        (left, Some(left))
    }
}

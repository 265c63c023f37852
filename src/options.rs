use std::fmt;

use crate::{
    address::{BlockedSpace, FlatSpace},
    error::StoreError,
    hash::HashFunction,
    probe::CollisionResolver,
    store::SlotStore,
};

const DEFAULT_CAPACITY: usize = 10;
const DEFAULT_KEY_LENGTH: usize = 2;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Layout {
    Flat,
    Blocked,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HashKind {
    Modulo,
    MidSquare,
    Truncation,
}

/// Settings a console session builds its store and hash function from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    pub layout: Layout,
    pub capacity: usize,
    pub key_length: usize,
    pub hash: HashKind,
    // digit positions for truncation hashing, 1-based
    pub positions: Vec<usize>,
    pub resolver: CollisionResolver,
}

impl Default for StoreOptions {
    fn default() -> StoreOptions {
        StoreOptions {
            layout: Layout::Flat,
            capacity: DEFAULT_CAPACITY,
            key_length: DEFAULT_KEY_LENGTH,
            hash: HashKind::Modulo,
            positions: vec![1],
            resolver: CollisionResolver::LinearProbing,
        }
    }
}

impl StoreOptions {
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), String> {
        match name.to_ascii_lowercase().as_str() {
            "layout" => {
                self.layout = match value {
                    "flat" => Layout::Flat,
                    "blocked" => Layout::Blocked,
                    _ => return Err(format!("Bad argument for Layout: {value}")),
                }
            }
            "capacity" => {
                self.capacity = value
                    .parse()
                    .map_err(|e| format!("Invalid Capacity value: {}", e))?;
            }
            "keylength" => {
                self.key_length = value
                    .parse()
                    .map_err(|e| format!("Invalid KeyLength value: {}", e))?;
            }
            "hash" => {
                self.hash = match value {
                    "modulo" => HashKind::Modulo,
                    "midsquare" => HashKind::MidSquare,
                    "truncation" => HashKind::Truncation,
                    _ => return Err(format!("Bad argument for Hash: {value}")),
                }
            }
            "positions" => {
                self.positions = value
                    .split(',')
                    .map(|p| p.trim().parse::<usize>())
                    .collect::<Result<_, _>>()
                    .map_err(|e| format!("Invalid Positions value: {}", e))?;
            }
            "resolver" => {
                self.resolver = CollisionResolver::from_label(value)
                    .ok_or(format!("Bad argument for Resolver: {value}"))?;
            }
            _ => return Err(format!("No such Option: {name}")),
        }
        Ok(())
    }

    pub fn hash_function(&self) -> Result<HashFunction, StoreError> {
        match self.hash {
            HashKind::Modulo => Ok(HashFunction::Modulo),
            HashKind::MidSquare => Ok(HashFunction::MidSquare),
            HashKind::Truncation => {
                HashFunction::digit_truncation(self.positions.clone(), self.key_length)
            }
        }
    }

    pub fn flat_store(&self) -> Result<SlotStore<FlatSpace>, StoreError> {
        SlotStore::new(self.capacity, self.key_length)
    }

    pub fn blocked_store(&self) -> Result<SlotStore<BlockedSpace>, StoreError> {
        SlotStore::blocked(self.capacity, self.key_length)
    }
}

impl fmt::Display for StoreOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions: Vec<String> = self.positions.iter().map(|p| p.to_string()).collect();
        writeln!(f, "Layout: {:?}", self.layout)?;
        writeln!(f, "Capacity: {}", self.capacity)?;
        writeln!(f, "KeyLength: {}", self.key_length)?;
        writeln!(f, "Hash: {:?}", self.hash)?;
        writeln!(f, "Positions: {}", positions.join(","))?;
        write!(f, "Resolver: {}", self.resolver)
    }
}

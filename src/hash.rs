use std::fmt;

use crate::{
    address::AddressSpace,
    error::{Result, StoreError},
    key::Key,
    SlotNumber,
};

/// Deterministic digit-arithmetic transforms from a numeric key to a slot.
///
/// Every variant maps into `1..=capacity`, and hashing the same key against
/// the same capacity always yields the same slot. Hashed lookup depends on
/// that: it replays the placement instead of keeping an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashFunction {
    Modulo,
    MidSquare,
    // 1-based digit positions, concatenated in the order given
    DigitTruncation { positions: Vec<usize> },
}

impl HashFunction {
    pub fn digit_truncation(positions: Vec<usize>, key_length: usize) -> Result<HashFunction> {
        if let Some(&bad) = positions.iter().find(|&&p| p == 0 || p > key_length) {
            return Err(StoreError::OutOfRange {
                what: "digit position",
                value: bad,
                max: key_length,
            });
        }
        Ok(HashFunction::DigitTruncation { positions })
    }

    pub fn slot_for(&self, key: &Key, capacity: usize) -> Result<SlotNumber> {
        if capacity == 0 {
            return Err(StoreError::InvalidCapacity {
                capacity,
                reason: "cannot hash into an empty space",
            });
        }
        let capacity = capacity as u128;
        let residue = match self {
            HashFunction::Modulo => key.numeric()? as u128 % capacity,
            HashFunction::MidSquare => mid_square(key.numeric()?)? % capacity,
            HashFunction::DigitTruncation { positions } => {
                // Positions may repeat, so the digit string has no width bound.
                extract_digits(key, positions)?
                    .chars()
                    .try_fold(0u128, |acc, c| -> Result<u128> {
                        let digit = c
                            .to_digit(10)
                            .ok_or_else(|| StoreError::MalformedKey(key.to_string()))?;
                        Ok((acc * 10 + digit as u128) % capacity)
                    })?
            }
        };
        Ok(residue as usize + 1)
    }

    /// Hashes `key` and decomposes the slot into a physical location of `space`.
    pub fn hash_position<A: AddressSpace>(&self, key: &Key, space: &A) -> Result<A::Location> {
        let slot = self.slot_for(key, space.capacity())?;
        space.to_location(slot)
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashFunction::Modulo => write!(f, "modulo"),
            HashFunction::MidSquare => write!(f, "midsquare"),
            HashFunction::DigitTruncation { positions } => {
                let list: Vec<String> = positions.iter().map(|p| p.to_string()).collect();
                write!(f, "truncation[{}]", list.join(","))
            }
        }
    }
}

// Middle digits of key^2: drop the outer quarter from each end.
fn mid_square(key: u64) -> Result<u128> {
    let squared = (key as u128 * key as u128).to_string();
    let len = squared.len();
    let (mut start, mut end) = (len / 4, len - len / 4);
    if start >= end {
        start = 0;
        end = len.min(3);
    }
    squared[start..end]
        .parse()
        .map_err(|_| StoreError::MalformedKey(key.to_string()))
}

fn extract_digits(key: &Key, positions: &[usize]) -> Result<String> {
    let digits: String = positions.iter().filter_map(|&p| key.digit_at(p)).collect();
    if digits.is_empty() {
        return Err(StoreError::ExtractionEmpty(key.to_string()));
    }
    Ok(digits)
}

use std::{cmp::Ordering, fmt};

use crate::error::{Result, StoreError};

// Widest key whose square still fits in a u128.
pub const MAX_KEY_LENGTH: usize = 19;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(s: &str, key_length: usize) -> Result<Key> {
        let actual = s.chars().count();
        if actual != key_length {
            return Err(StoreError::KeyLengthMismatch {
                key: s.to_string(),
                expected: key_length,
                actual,
            });
        }
        Ok(Key(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_numeric(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    /// The key read as an unsigned decimal number.
    pub fn numeric(&self) -> Result<u64> {
        if !self.is_numeric() {
            return Err(StoreError::MalformedKey(self.0.clone()));
        }
        self.0
            .parse()
            .map_err(|_| StoreError::MalformedKey(self.0.clone()))
    }

    /// The digit at a 1-based position, if the key is that long.
    pub fn digit_at(&self, position: usize) -> Option<char> {
        if position == 0 {
            return None;
        }
        self.0.chars().nth(position - 1)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyOrder {
    Numeric,
    Lexicographic,
}

impl KeyOrder {
    /// Numeric only when every key parses as an integer.
    pub fn for_keys<'a, I>(keys: I) -> KeyOrder
    where
        I: IntoIterator<Item = &'a Key>,
    {
        if keys.into_iter().all(Key::is_numeric) {
            KeyOrder::Numeric
        } else {
            KeyOrder::Lexicographic
        }
    }

    pub fn compare(&self, a: &Key, b: &Key) -> Ordering {
        match self {
            KeyOrder::Numeric => match (a.numeric(), b.numeric()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => a.0.cmp(&b.0),
            },
            KeyOrder::Lexicographic => a.0.cmp(&b.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::key::*;

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            Key::new("123", 2),
            Err(StoreError::KeyLengthMismatch {
                key: String::from("123"),
                expected: 2,
                actual: 3
            })
        );
        assert!(Key::new("12", 2).is_ok());
    }

    #[test]
    fn numeric_view() {
        assert_eq!(Key::new("0042", 4).unwrap().numeric(), Ok(42));
        assert_eq!(
            Key::new("4a", 2).unwrap().numeric(),
            Err(StoreError::MalformedKey(String::from("4a")))
        );
        let widest = Key::new("9999999999999999999", MAX_KEY_LENGTH).unwrap();
        assert_eq!(widest.numeric(), Ok(9_999_999_999_999_999_999));
    }

    #[test]
    fn digit_positions_are_one_based() {
        let k = Key::new("10203040", 8).unwrap();
        assert_eq!(k.digit_at(1), Some('1'));
        assert_eq!(k.digit_at(4), Some('0'));
        assert_eq!(k.digit_at(7), Some('4'));
        assert_eq!(k.digit_at(9), None);
        assert_eq!(k.digit_at(0), None);
    }

    #[test]
    fn order_falls_back_to_strings() {
        let a = Key::new("09", 2).unwrap();
        let b = Key::new("10", 2).unwrap();
        let c = Key::new("ab", 2).unwrap();
        assert_eq!(KeyOrder::for_keys([&a, &b]), KeyOrder::Numeric);
        assert_eq!(KeyOrder::for_keys([&a, &c]), KeyOrder::Lexicographic);
        assert_eq!(KeyOrder::Numeric.compare(&a, &b), Ordering::Less);
        assert_eq!(KeyOrder::Numeric.compare(&b, &c), Ordering::Less);
        assert_eq!(KeyOrder::Lexicographic.compare(&c, &b), Ordering::Greater);
    }
}

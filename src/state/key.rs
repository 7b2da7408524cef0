//! Keys of the state map
//!
//! A key is an ordered sequence of opaque byte components, e.g. the
//! group-by fields of a stream aggregation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered sequence of opaque key components.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Key(Vec<Vec<u8>>);

impl Key {
    /// Build a key from its components.
    pub fn new(parts: Vec<Vec<u8>>) -> Self {
        Self(parts)
    }

    /// Build a key with exactly one component.
    pub fn single(part: impl Into<Vec<u8>>) -> Self {
        Self(vec![part.into()])
    }

    /// Returns the components in order.
    pub fn parts(&self) -> &[Vec<u8>] {
        &self.0
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the key, returning its components.
    pub fn into_parts(self) -> Vec<Vec<u8>> {
        self.0
    }
}

impl From<&str> for Key {
    fn from(part: &str) -> Self {
        Self::single(part)
    }
}

impl From<String> for Key {
    fn from(part: String) -> Self {
        Self::single(part)
    }
}

impl<P: Into<Vec<u8>>> FromIterator<P> for Key {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Human-readable rendering for logs: components joined by `/`,
/// non-UTF-8 bytes replaced.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", String::from_utf8_lossy(part))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_component() {
        let key = Key::from("word");
        assert_eq!(key.len(), 1);
        assert_eq!(key.parts()[0], b"word".to_vec());
    }

    #[test]
    fn test_composite_key_from_iter() {
        let key: Key = ["us", "2024", "clicks"].into_iter().collect();
        assert_eq!(key.len(), 3);
        assert_eq!(key.to_string(), "us/2024/clicks");
    }

    #[test]
    fn test_equality_is_structural() {
        let a: Key = ["a", "b"].into_iter().collect();
        let b: Key = ["a", "b"].into_iter().collect();
        let c: Key = ["ab"].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ordering_is_componentwise() {
        let a: Key = ["a", "z"].into_iter().collect();
        let b: Key = ["b"].into_iter().collect();
        assert!(a < b);
    }
}

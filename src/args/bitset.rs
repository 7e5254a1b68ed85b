/// A growable set of small non-negative integers, stored one bit per value.
///
/// Used by the output wrapper to remember which ordered tokens have already
/// been consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with room for values in `0..capacity` without growing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            len: 0,
        }
    }

    pub fn contains(&self, value: usize) -> bool {
        self.words
            .get(value / 64)
            .is_some_and(|&word| word & (1u64 << (value % 64)) != 0)
    }

    /// Adds a value. Returns `false` if it was already present.
    pub fn insert(&mut self, value: usize) -> bool {
        let index = value / 64;
        if index >= self.words.len() {
            self.words.resize(index + 1, 0);
        }

        let mask = 1u64 << (value % 64);
        if self.words[index] & mask != 0 {
            return false;
        }
        self.words[index] |= mask;
        self.len += 1;
        true
    }

    /// Number of values in the set.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = BitSet::with_capacity(10);
        assert!(!set.contains(3));
        assert!(set.insert(3));
        assert!(!set.insert(3));
        assert!(set.contains(3));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_grows_past_capacity() {
        let mut set = BitSet::new();
        assert!(!set.contains(500));
        set.insert(500);
        set.insert(63);
        set.insert(64);
        assert!(set.contains(500));
        assert!(set.contains(63) && set.contains(64));
        assert!(!set.contains(65) && !set.contains(499));
        assert_eq!(set.len(), 3);
    }
}

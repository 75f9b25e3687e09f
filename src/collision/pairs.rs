//! O(1) deduplication of collision pairs.
//!
//! Bodies spanning multiple tiles show up in multiple buckets, so the same
//! pair can be offered by the broad phase more than once per sub-step. This
//! table answers "did we already handle these two" without scanning.

use slotmap::Key;

use crate::rigidbody::BodyKey;

/// Number of buckets the pair keys hash into, must be a power of two.
const BUCKETS: usize = 256;

/// Chained hash table over unordered body pairs.
///
/// The bucket vectors are reused over clears so the table stops allocating
/// once the simulation reaches a steady state.
pub struct PairTable {
    /// Chain per hash bucket.
    buckets: Vec<Vec<(BodyKey, BodyKey)>>,
    /// Registered pairs since the last clear.
    len: usize,
}

impl PairTable {
    /// Construct an empty table.
    pub fn new() -> Self {
        let buckets = (0..BUCKETS).map(|_| Vec::new()).collect();
        let len = 0;

        Self { buckets, len }
    }

    /// Forget all pairs but keep the bucket allocations.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Whether a pair was registered since the last clear, in either order.
    pub fn contains(&self, a: BodyKey, b: BodyKey) -> bool {
        let pair = Self::ordered(a, b);

        self.buckets[Self::bucket(pair)].contains(&pair)
    }

    /// Register a pair.
    ///
    /// Returns `false` without registering when the pair is already known.
    pub fn insert(&mut self, a: BodyKey, b: BodyKey) -> bool {
        let pair = Self::ordered(a, b);
        let bucket = &mut self.buckets[Self::bucket(pair)];

        if bucket.contains(&pair) {
            return false;
        }

        bucket.push(pair);
        self.len += 1;

        true
    }

    /// Registered pairs since the last clear.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no pair is registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Normalize a pair so both orders map to the same key.
    fn ordered(a: BodyKey, b: BodyKey) -> (BodyKey, BodyKey) {
        if a.data().as_ffi() <= b.data().as_ffi() {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Hash bucket for a normalized pair.
    fn bucket((a, b): (BodyKey, BodyKey)) -> usize {
        ((a.data().as_ffi() ^ b.data().as_ffi()) as usize) & (BUCKETS - 1)
    }
}

impl Default for PairTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use slotmap::HopSlotMap;

    use crate::rigidbody::BodyKey;

    use super::PairTable;

    fn keys(amount: usize) -> Vec<BodyKey> {
        let mut map: HopSlotMap<BodyKey, ()> = HopSlotMap::with_key();

        (0..amount).map(|_| map.insert(())).collect()
    }

    /// A pair registers exactly once no matter the order or repetition.
    #[test]
    fn test_register_once() {
        let keys = keys(3);
        let mut table = PairTable::new();

        assert!(!table.contains(keys[0], keys[1]));
        assert!(table.insert(keys[0], keys[1]));
        assert!(!table.insert(keys[0], keys[1]));
        assert!(!table.insert(keys[1], keys[0]));

        assert!(table.contains(keys[0], keys[1]));
        assert!(table.contains(keys[1], keys[0]));
        assert!(!table.contains(keys[0], keys[2]));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_clear_keeps_nothing() {
        let keys = keys(2);
        let mut table = PairTable::new();

        table.insert(keys[0], keys[1]);
        table.clear();

        assert!(table.is_empty());
        assert!(!table.contains(keys[0], keys[1]));
        assert!(table.insert(keys[0], keys[1]));
    }
}

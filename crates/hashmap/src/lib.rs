//! # OpenHashMap
//!
//! A separate-chaining hash map used for every lookup table in the Murmur feed
//! engine: the user and post registries, and each user's follow, seen and
//! liked sets.
//!
//! Entries live in a dense arena (`Vec`). Each bucket stores the arena index
//! of the head of its collision chain, and every entry stores the index of
//! the next entry in the same bucket. New entries are prepended to their
//! chain after a linear scan confirms the key is absent.
//!
//! ## Key properties
//! - **One entry per key**: `insert` on an existing key overwrites its value.
//! - **Prime-sized growth**: once `len / capacity >= load_factor` the table is
//!   rehashed into the smallest prime capacity strictly greater than
//!   `2 * capacity`.
//! - **Deterministic layout**: the default hasher is a fixed-key `ahash`
//!   hasher, so bucket order is stable between runs.
//! - **Unordered iteration**: iteration walks buckets in index order and each
//!   chain head-first. Insertion order is not preserved.
//!
//! ## Example
//! ```rust
//! use hashmap::OpenHashMap;
//!
//! let mut m = OpenHashMap::new();
//! m.insert("user1".to_string(), 3);
//! assert_eq!(m.get("user1"), Some(&3));
//!
//! m.remove("user1");
//! assert!(!m.contains_key("user1"));
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};

use ahash::AHasher;

/// Bucket count of a map built with [`OpenHashMap::new`].
pub const DEFAULT_CAPACITY: usize = 17;

/// Load factor at which a map built with [`OpenHashMap::new`] grows.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Hasher used when none is supplied. Fixed keys, so layouts are reproducible.
pub type DefaultHashBuilder = BuildHasherDefault<AHasher>;

#[derive(Debug, Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    /// Arena index of the next entry in the same bucket.
    next: Option<usize>,
}

/// A hash map resolving collisions by separate chaining.
///
/// The map grows but never shrinks; [`clear`](OpenHashMap::clear) drops the
/// entries and keeps the current capacity.
#[derive(Clone)]
pub struct OpenHashMap<K, V, S = DefaultHashBuilder> {
    buckets: Vec<Option<usize>>,
    entries: Vec<Entry<K, V>>,
    load_factor: f64,
    hash_builder: S,
}

impl<K, V> OpenHashMap<K, V> {
    /// Creates an empty map with 17 buckets and a 0.75 load factor.
    pub fn new() -> Self {
        Self::with_capacity_and_load_factor(DEFAULT_CAPACITY, DEFAULT_LOAD_FACTOR)
    }

    /// Creates an empty map with the given bucket count and growth threshold.
    ///
    /// A `capacity` of zero is raised to one.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not a finite, strictly positive number.
    pub fn with_capacity_and_load_factor(capacity: usize, load_factor: f64) -> Self {
        Self::with_hasher(capacity, load_factor, DefaultHashBuilder::default())
    }
}

impl<K, V, S> OpenHashMap<K, V, S> {
    /// Creates an empty map that hashes keys with `hash_builder`.
    ///
    /// # Panics
    ///
    /// Panics if `load_factor` is not a finite, strictly positive number.
    pub fn with_hasher(capacity: usize, load_factor: f64, hash_builder: S) -> Self {
        assert!(
            load_factor.is_finite() && load_factor > 0.0,
            "load factor must be finite and positive, got {load_factor}"
        );
        Self {
            buckets: vec![None; capacity.max(1)],
            entries: Vec::new(),
            load_factor,
            hash_builder,
        }
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the current number of buckets.
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the growth threshold this map was built with.
    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Removes every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.buckets.iter_mut().for_each(|b| *b = None);
    }

    /// Iterates over `(key, value)` pairs in bucket order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            buckets: self.buckets.iter(),
            entries: &self.entries,
            cursor: None,
            remaining: self.entries.len(),
        }
    }

    /// Iterates over keys in bucket order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    /// Iterates over values in bucket order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Iterates mutably over values. The order is unspecified.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.entries.iter_mut().map(|e| &mut e.value)
    }
}

impl<K, V, S> OpenHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts `value` under `key`, returning the value it replaced.
    ///
    /// When the key is new and the insertion pushes the load factor to the
    /// threshold, the table is rehashed before returning.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(idx) = self.find(&key) {
            return Some(std::mem::replace(&mut self.entries[idx].value, value));
        }

        let bucket = self.bucket_of(&key);
        let idx = self.entries.len();
        self.entries.push(Entry {
            key,
            value,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(idx);

        if self.entries.len() as f64 / self.buckets.len() as f64 >= self.load_factor {
            self.rehash();
        }
        None
    }

    /// Returns a reference to the value stored under `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|idx| &self.entries[idx].value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|idx| &mut self.entries[idx].value)
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes the entry for `key`, returning its value. Absent keys are a no-op.
    ///
    /// The arena stays dense: the last entry is moved into the freed slot and
    /// the one link that pointed at it is updated.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let bucket = self.bucket_of(key);
        let mut prev: Option<usize> = None;
        let mut cursor = self.buckets[bucket];

        while let Some(idx) = cursor {
            if self.entries[idx].key.borrow() == key {
                let next = self.entries[idx].next;
                match prev {
                    None => self.buckets[bucket] = next,
                    Some(p) => self.entries[p].next = next,
                }
                let last = self.entries.len() - 1;
                if idx != last {
                    self.relink(last, idx);
                }
                return Some(self.entries.swap_remove(idx).value);
            }
            prev = cursor;
            cursor = self.entries[idx].next;
        }
        None
    }

    fn bucket_of<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        (self.hash_builder.hash_one(key) % self.buckets.len() as u64) as usize
    }

    fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut cursor = self.buckets[self.bucket_of(key)];
        while let Some(idx) = cursor {
            let entry = &self.entries[idx];
            if entry.key.borrow() == key {
                return Some(idx);
            }
            cursor = entry.next;
        }
        None
    }

    /// Redirects whichever link points at arena slot `from` to slot `to`.
    fn relink(&mut self, from: usize, to: usize) {
        let bucket = self.bucket_of(&self.entries[from].key);
        if self.buckets[bucket] == Some(from) {
            self.buckets[bucket] = Some(to);
            return;
        }
        let mut cursor = self.buckets[bucket];
        while let Some(idx) = cursor {
            if self.entries[idx].next == Some(from) {
                self.entries[idx].next = Some(to);
                return;
            }
            cursor = self.entries[idx].next;
        }
    }

    /// Moves every entry into a table of `next_prime(2 * capacity + 1)` buckets.
    ///
    /// Relinking never inserts, so a rehash cannot trigger another one.
    fn rehash(&mut self) {
        let old_capacity = self.buckets.len();
        let new_capacity = next_prime(old_capacity.saturating_mul(2).saturating_add(1));
        tracing::trace!(
            from = old_capacity,
            to = new_capacity,
            entries = self.entries.len(),
            "rehashing map"
        );

        self.buckets = vec![None; new_capacity];
        for idx in 0..self.entries.len() {
            let bucket = self.bucket_of(&self.entries[idx].key);
            self.entries[idx].next = self.buckets[bucket];
            self.buckets[bucket] = Some(idx);
        }
    }
}

impl<K, V> Default for OpenHashMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for OpenHashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for OpenHashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K: Hash + Eq, V> FromIterator<(K, V)> for OpenHashMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a OpenHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of an [`OpenHashMap`], bucket by bucket.
pub struct Iter<'a, K, V> {
    buckets: std::slice::Iter<'a, Option<usize>>,
    entries: &'a [Entry<K, V>],
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(idx) = self.cursor {
                let entry = &self.entries[idx];
                self.cursor = entry.next;
                self.remaining -= 1;
                return Some((&entry.key, &entry.value));
            }
            self.cursor = *self.buckets.next()?;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Returns `true` if `n` is prime.
pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Returns the smallest prime greater than or equal to `n`.
pub fn next_prime(mut n: usize) -> usize {
    while !is_prime(n) {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    // -------------------- Basic CRUD --------------------

    #[test]
    fn insert_and_get_single_key() {
        let mut m = OpenHashMap::new();
        assert!(m.insert("k1".to_string(), 1).is_none());
        assert_eq!(m.len(), 1);
        assert_eq!(m.get("k1"), Some(&1));
    }

    #[test]
    fn insert_overwrites_existing_key() {
        let mut m = OpenHashMap::new();
        m.insert("k".to_string(), "v1");
        assert_eq!(m.insert("k".to_string(), "v2"), Some("v1"));
        assert_eq!(m.get("k"), Some(&"v2"));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn get_missing_key_returns_none() {
        let m: OpenHashMap<String, u32> = OpenHashMap::new();
        assert!(m.get("nope").is_none());
        assert!(!m.contains_key("nope"));
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut m = OpenHashMap::new();
        m.insert("post1".to_string(), 0u32);
        *m.get_mut("post1").unwrap() += 5;
        assert_eq!(m.get("post1"), Some(&5));
    }

    #[test]
    fn remove_returns_value_and_forgets_key() {
        let mut m = OpenHashMap::new();
        m.insert("a".to_string(), 1);
        assert_eq!(m.remove("a"), Some(1));
        assert!(m.is_empty());
        assert!(!m.contains_key("a"));
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let mut m = OpenHashMap::new();
        m.insert("a".to_string(), 1);
        assert_eq!(m.remove("b"), None);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn reinsert_after_remove() {
        let mut m = OpenHashMap::new();
        m.insert("k".to_string(), 1);
        m.remove("k");
        m.insert("k".to_string(), 2);
        assert_eq!(m.get("k"), Some(&2));
        assert_eq!(m.len(), 1);
    }

    // -------------------- Collisions --------------------

    #[test]
    fn single_bucket_chain_holds_everything() {
        // One bucket and a huge threshold: every key shares one chain.
        let mut m = OpenHashMap::with_capacity_and_load_factor(1, 1_000.0);
        for i in 0..50 {
            m.insert(i, i * 10);
        }
        assert_eq!(m.capacity(), 1);
        for i in 0..50 {
            assert_eq!(m.get(&i), Some(&(i * 10)));
        }
    }

    #[test]
    fn remove_from_middle_of_chain_keeps_neighbours() {
        let mut m = OpenHashMap::with_capacity_and_load_factor(1, 1_000.0);
        for i in 0..10 {
            m.insert(i, i);
        }
        for i in [0, 5, 9, 3] {
            assert_eq!(m.remove(&i), Some(i));
        }
        for i in 0..10 {
            let expected = ![0, 5, 9, 3].contains(&i);
            assert_eq!(m.contains_key(&i), expected, "key {}", i);
        }
        assert_eq!(m.len(), 6);
    }

    #[test]
    fn remove_relinks_moved_entry_in_other_bucket() {
        let mut m = OpenHashMap::with_capacity_and_load_factor(7, 1_000.0);
        for i in 0..40 {
            m.insert(i, i);
        }
        // Remove early entries so the arena tail is moved repeatedly.
        for i in 0..20 {
            assert_eq!(m.remove(&i), Some(i));
        }
        for i in 20..40 {
            assert_eq!(m.get(&i), Some(&i));
        }
        assert_eq!(m.iter().count(), 20);
    }

    // -------------------- Growth --------------------

    #[test]
    fn default_map_starts_at_seventeen() {
        let m: OpenHashMap<u32, u32> = OpenHashMap::default();
        assert_eq!(m.capacity(), 17);
        assert_eq!(m.load_factor(), 0.75);
    }

    #[test]
    fn rehash_triggers_at_threshold() {
        let mut m = OpenHashMap::new();
        // 12 / 17 < 0.75, 13 / 17 >= 0.75
        for i in 0..12 {
            m.insert(i, ());
        }
        assert_eq!(m.capacity(), 17);
        m.insert(12, ());
        assert_eq!(m.capacity(), 37);
    }

    #[test]
    fn overwrite_does_not_trigger_growth() {
        let mut m = OpenHashMap::new();
        for i in 0..12 {
            m.insert(i, 0);
        }
        for _ in 0..100 {
            m.insert(0, 1);
        }
        assert_eq!(m.capacity(), 17);
    }

    #[test]
    fn growth_keeps_every_pair() {
        let mut m = OpenHashMap::new();
        let mut last_capacity = m.capacity();
        for i in 0..10_000u32 {
            m.insert(format!("key{}", i), i);
            if m.capacity() != last_capacity {
                assert!(m.capacity() > 2 * last_capacity);
                assert!(is_prime(m.capacity()));
                last_capacity = m.capacity();
            }
        }
        assert_eq!(m.len(), 10_000);
        for i in 0..10_000u32 {
            assert_eq!(m.get(format!("key{}", i).as_str()), Some(&i));
        }
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut m = OpenHashMap::with_capacity_and_load_factor(0, 0.75);
        assert_eq!(m.capacity(), 1);
        m.insert("a", 1);
        assert_eq!(m.get("a"), Some(&1));
    }

    #[test]
    #[should_panic]
    fn zero_load_factor_panics() {
        let _m: OpenHashMap<u8, u8> = OpenHashMap::with_capacity_and_load_factor(17, 0.0);
    }

    // -------------------- Primes --------------------

    #[test]
    fn prime_helpers() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(17));
        assert!(!is_prime(35));
        assert_eq!(next_prime(35), 37);
        assert_eq!(next_prime(37), 37);
        assert_eq!(next_prime(75), 79);
    }

    // -------------------- Iteration --------------------

    #[test]
    fn iter_yields_every_entry_once() {
        let m: OpenHashMap<u32, u32> = (0..100).map(|i| (i, i * 2)).collect();
        let mut seen: Vec<_> = m.iter().map(|(k, v)| (*k, *v)).collect();
        seen.sort();
        assert_eq!(seen, (0..100).map(|i| (i, i * 2)).collect::<Vec<_>>());
        assert_eq!(m.iter().len(), 100);
    }

    #[test]
    fn keys_and_values_agree_with_iter() {
        let m: OpenHashMap<&str, u32> = [("a", 1), ("b", 2), ("c", 3)].into_iter().collect();
        let keys: Vec<_> = m.keys().copied().collect();
        let values: Vec<_> = m.values().copied().collect();
        let pairs: Vec<_> = (&m).into_iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(keys, pairs.iter().map(|p| p.0).collect::<Vec<_>>());
        assert_eq!(values, pairs.iter().map(|p| p.1).collect::<Vec<_>>());
    }

    #[test]
    fn iter_empty_map() {
        let m: OpenHashMap<u32, u32> = OpenHashMap::new();
        assert_eq!(m.iter().count(), 0);
    }

    #[test]
    fn values_mut_reaches_every_value() {
        let mut m: OpenHashMap<u32, u32> = (0..20).map(|i| (i, i)).collect();
        m.values_mut().for_each(|v| *v += 1);
        for i in 0..20 {
            assert_eq!(m.get(&i), Some(&(i + 1)));
        }
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut m: OpenHashMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
        let cap = m.capacity();
        m.clear();
        assert!(m.is_empty());
        assert_eq!(m.capacity(), cap);
        assert!(m.get(&5).is_none());
        m.insert(5, 50);
        assert_eq!(m.get(&5), Some(&50));
    }

    // -------------------- Properties --------------------

    #[derive(Debug, Clone)]
    enum Op {
        Put(u8, u32),
        Remove(u8),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Put(k, v)),
            any::<u8>().prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn behaves_like_std_hashmap(ops in proptest::collection::vec(op(), 0..400)) {
            let mut ours = OpenHashMap::with_capacity_and_load_factor(3, 0.75);
            let mut model = HashMap::new();
            for op in ops {
                match op {
                    Op::Put(k, v) => prop_assert_eq!(ours.insert(k, v), model.insert(k, v)),
                    Op::Remove(k) => prop_assert_eq!(ours.remove(&k), model.remove(&k)),
                }
            }
            prop_assert_eq!(ours.len(), model.len());
            for k in 0..=u8::MAX {
                prop_assert_eq!(ours.get(&k), model.get(&k));
                prop_assert_eq!(ours.contains_key(&k), model.contains_key(&k));
            }
            prop_assert!(is_prime(ours.capacity()));
        }
    }
}

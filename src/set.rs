//! BucketSet: a key-only view over [`BucketMap`].

use crate::config::Config;
use crate::directory::{Chained, Directory};
use crate::entry_store::{Order, Unordered};
use crate::error::Error;
use crate::iter::Keys;
use crate::map::BucketMap;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// A hash set with the same collision and ordering parameters as
/// [`BucketMap`].
///
/// ```
/// use bucket_map::OrderedSet;
///
/// let mut s = OrderedSet::with_capacity_and_load_factor(4, 0.7).unwrap();
/// for k in 1..=4 {
///     s.insert(k);
/// }
/// s.remove(&2);
/// assert_eq!(s.iter().copied().collect::<Vec<_>>(), [1, 3, 4]);
/// ```
pub struct BucketSet<K, D = Chained, O = Unordered, S = DefaultHashBuilder> {
    map: BucketMap<K, (), D, O, S>,
}

impl<K, D, O> BucketSet<K, D, O>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
{
    pub fn new() -> Self {
        Self {
            map: BucketMap::new(),
        }
    }

    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        max_load_factor: f64,
    ) -> Result<Self, Error> {
        BucketMap::with_capacity_and_load_factor(initial_capacity, max_load_factor)
            .map(|map| Self { map })
    }

    pub fn with_config(config: Config) -> Result<Self, Error> {
        BucketMap::with_config(config).map(|map| Self { map })
    }
}

impl<K, D, O> Default for BucketSet<K, D, O>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, D, O, S> BucketSet<K, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            map: BucketMap::with_hasher(hasher),
        }
    }

    pub fn with_config_and_hasher(config: Config, hasher: S) -> Result<Self, Error> {
        BucketMap::with_config_and_hasher(config, hasher).map(|map| Self { map })
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.map.bucket_count()
    }

    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    pub fn load_factor(&self) -> f64 {
        self.map.load_factor()
    }

    pub fn max_load_factor(&self) -> f64 {
        self.map.max_load_factor()
    }

    pub fn tombstone_count(&self) -> usize {
        self.map.tombstone_count()
    }

    /// `true` if `key` was not yet present.
    pub fn insert(&mut self, key: K) -> bool {
        self.map.insert(key, ())
    }

    pub fn try_insert(&mut self, key: K) -> Result<bool, Error> {
        self.map.try_insert(key, ())
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(q)
    }

    /// The stored key equal to `q`.
    pub fn get<Q>(&self, q: &Q) -> Result<&K, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map
            .get_key_value(q)
            .map(|(k, _)| k)
            .ok_or(Error::KeyNotFound)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove(q)
    }

    /// Removes and returns the stored key equal to `q`.
    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.remove_entry(q).map(|(k, ())| k)
    }

    pub fn clear(&mut self) {
        self.map.clear()
    }

    pub fn resize(&mut self, bucket_count: usize) -> Result<(), Error> {
        self.map.resize(bucket_count)
    }

    pub fn iter(&self) -> Keys<'_, K, ()> {
        self.map.keys()
    }
}

impl<K, D, O, S> Clone for BucketSet<K, D, O, S>
where
    K: Clone,
    D: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<K, D, O, S> fmt::Debug for BucketSet<K, D, O, S>
where
    K: Eq + Hash + fmt::Debug,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K, D, O, S> IntoIterator for &'a BucketSet<K, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    type Item = &'a K;
    type IntoIter = Keys<'a, K, ()>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, D, O, S> Extend<K> for BucketSet<K, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|k| (k, ())));
    }
}

impl<K, D, O, S> FromIterator<K> for BucketSet<K, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::with_hasher(S::default());
        set.extend(iter);
        set
    }
}

//! BucketMap: the generic container tying directory, entry store and resize
//! policy together.

use crate::config::Config;
use crate::directory::{Chained, Directory, Probe};
use crate::entry_store::{EntryKey, EntryStore, Order, Unordered};
use crate::error::Error;
use crate::iter::{Iter, Keys, Values};
use crate::reentrancy::DebugReentrancy;
use crate::resize;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// A hash map generic over collision resolution (`D`) and iteration order
/// (`O`).
///
/// - `D`: [`Chained`] (default) or [`LinearProbing`](crate::LinearProbing).
/// - `O`: [`Unordered`] (default) or [`InsertionOrder`](crate::InsertionOrder).
/// - `S`: the hash builder; keys must be `Eq + Hash`.
///
/// The bucket directory is allocated on first insert and grows by a factor of
/// two whenever `len / bucket_count` reaches the configured maximum load
/// factor. It never shrinks.
///
/// Inserting an existing key is a no-op that returns `false`:
///
/// ```
/// use bucket_map::ChainedMap;
///
/// let mut m = ChainedMap::new();
/// assert!(m.insert("k", 1));
/// assert!(!m.insert("k", 2));
/// assert_eq!(m.get("k"), Ok(&1));
/// ```
pub struct BucketMap<K, V, D = Chained, O = Unordered, S = DefaultHashBuilder> {
    hasher: S,
    config: Config,
    directory: D,
    entries: EntryStore<K, V, O>,
    reentrancy: DebugReentrancy,
    #[cfg(test)]
    rebuilds: usize,
}

impl<K, V, D, O> BucketMap<K, V, D, O>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
{
    /// Empty map with the default configuration (16 buckets once populated,
    /// load factor 0.7).
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Fails with [`Error::InvalidConfiguration`] when `max_load_factor` is
    /// not positive or `initial_capacity` is zero.
    pub fn with_capacity_and_load_factor(
        initial_capacity: usize,
        max_load_factor: f64,
    ) -> Result<Self, Error> {
        Self::with_config(
            Config::new()
                .with_initial_capacity(initial_capacity)
                .with_max_load_factor(max_load_factor),
        )
    }

    pub fn with_config(config: Config) -> Result<Self, Error> {
        Self::with_config_and_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, D, O> Default for BucketMap<K, V, D, O>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, D, O, S> BucketMap<K, V, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self::from_parts(Config::new(), hasher)
    }

    pub fn with_config_and_hasher(config: Config, hasher: S) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self::from_parts(config, hasher))
    }

    fn from_parts(config: Config, hasher: S) -> Self {
        Self {
            hasher,
            config,
            directory: D::unallocated(),
            entries: EntryStore::new(),
            reentrancy: DebugReentrancy::new(),
            #[cfg(test)]
            rebuilds: 0,
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        let _g = self.reentrancy.enter("hash");
        self.hasher.hash_one(q)
    }

    /// Probes the (allocated) directory for `q`.
    fn probe<Q>(&self, hash: u64, q: &Q) -> Probe
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        debug_assert!(self.directory.bucket_count() > 0);
        let _g = self.reentrancy.enter("lookup");
        let entries = &self.entries;
        self.directory
            .probe(hash, |k| entries.matches(k, hash, |key| <K as Borrow<Q>>::borrow(key) == q))
    }

    fn find<Q>(&self, q: &Q) -> Option<EntryKey>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.entries.is_empty() {
            return None;
        }
        let hash = self.make_hash(q);
        match self.probe(hash, q) {
            Probe::Found(_, k) => Some(k),
            Probe::Vacant(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of buckets (chains or probe slots); 0 until the first insert.
    pub fn bucket_count(&self) -> usize {
        self.directory.bucket_count()
    }

    /// Same as [`bucket_count`](Self::bucket_count).
    pub fn capacity(&self) -> usize {
        self.bucket_count()
    }

    /// `len / bucket_count`, or 0.0 while no directory is allocated.
    pub fn load_factor(&self) -> f64 {
        match self.bucket_count() {
            0 => 0.0,
            n => self.len() as f64 / n as f64,
        }
    }

    pub fn max_load_factor(&self) -> f64 {
        self.config.max_load_factor()
    }

    /// Tombstoned probe slots awaiting compaction; always 0 when chained.
    pub fn tombstone_count(&self) -> usize {
        self.directory.tombstones()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Value stored under `q`, or [`Error::KeyNotFound`]. An empty map
    /// reports the same error.
    pub fn get<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(q).map(|(_, v)| v).ok_or(Error::KeyNotFound)
    }

    /// Mutable access to the value stored under `q`. Keys cannot be modified.
    #[doc(alias = "modify")]
    pub fn get_mut<Q>(&mut self, q: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q).ok_or(Error::KeyNotFound)?;
        self.entries
            .get_mut(k)
            .map(|e| &mut e.value)
            .ok_or(Error::KeyNotFound)
    }

    pub fn get_key_value<Q>(&self, q: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.entries.get(k).map(|e| (&e.key, &e.value))
    }

    /// Inserts `key -> value` unless `key` is already present.
    ///
    /// Returns `true` when the entry was added. A duplicate leaves the stored
    /// value untouched and returns `false`.
    ///
    /// # Panics
    ///
    /// Panics if the bucket directory cannot be allocated; use
    /// [`try_insert`](Self::try_insert) to handle that case.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        match self.try_insert(key, value) {
            Ok(inserted) => inserted,
            Err(e) => panic!("BucketMap::insert: {e}"),
        }
    }

    /// Like [`insert`](Self::insert), but reports directory allocation
    /// failure as [`Error::AllocationFailure`]. On error the map is exactly
    /// as before the call and `key`/`value` are dropped.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool, Error> {
        let hash = self.make_hash(&key);
        let plan = if self.directory.bucket_count() == 0 {
            // No directory means no entries; the key cannot be a duplicate.
            resize::plan_initial::<D>(&self.config)
        } else {
            let at = match self.probe(hash, &key) {
                Probe::Found(..) => return Ok(false),
                Probe::Vacant(at) => at,
            };
            let planned = resize::plan_after_insert::<D>(
                &self.config,
                self.entries.len() + 1,
                self.directory.bucket_count(),
                self.directory.tombstones(),
            );
            match planned {
                Some(plan) => plan,
                None => {
                    self.directory.reserve_at(at)?;
                    let k = self.entries.insert(key, value, hash);
                    self.directory.occupy(at, k);
                    return Ok(true);
                }
            }
        };

        // Everything fallible happens before the entry store changes.
        let mut next = resize::rebuild(&self.directory, &self.entries, plan, Some(hash))?;
        let k = self.entries.insert(key, value, hash);
        let at = next.vacant_for(hash);
        next.occupy(at, k);
        self.directory = next;
        #[cfg(test)]
        {
            self.rebuilds += 1;
        }
        Ok(true)
    }

    /// Removes `q`; `true` if it was present.
    pub fn remove<Q>(&mut self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(q).is_some()
    }

    /// Removes `q` and hands back the owned pair.
    pub fn remove_entry<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.entries.is_empty() {
            return None;
        }
        let hash = self.make_hash(q);
        let Probe::Found(at, k) = self.probe(hash, q) else {
            return None;
        };
        self.directory.vacate(at);
        // The structure is consistent again before K/V drop code can run.
        self.entries.remove(k)
    }

    /// Drops every entry and releases the directory. The next insert
    /// allocates the configured initial bucket count again.
    pub fn clear(&mut self) {
        log::trace!(
            "clearing {} directory: {} entries, {} buckets",
            D::STRATEGY,
            self.len(),
            self.bucket_count()
        );
        self.directory = D::unallocated();
        self.entries.clear();
    }

    /// Rebuilds the directory with at least `bucket_count` buckets.
    ///
    /// Never shrinks. For linear probing this also clears tombstones, and the
    /// result always has more buckets than entries.
    pub fn resize(&mut self, bucket_count: usize) -> Result<(), Error> {
        let Some(plan) = resize::plan_explicit::<D>(
            bucket_count,
            self.len(),
            self.directory.bucket_count(),
            self.directory.tombstones(),
        ) else {
            return Ok(());
        };
        self.directory = resize::rebuild(&self.directory, &self.entries, plan, None)?;
        Ok(())
    }

    /// Entries in iteration order: oldest first with
    /// [`InsertionOrder`](crate::InsertionOrder), arena order otherwise.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(&self.entries)
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values::new(self.iter())
    }
}

impl<K, V, D, O, S> Clone for BucketMap<K, V, D, O, S>
where
    K: Clone,
    V: Clone,
    D: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            config: self.config,
            directory: self.directory.clone(),
            entries: self.entries.clone(),
            reentrancy: DebugReentrancy::new(),
            #[cfg(test)]
            rebuilds: 0,
        }
    }
}

impl<K, V, D, O, S> fmt::Debug for BucketMap<K, V, D, O, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, D, O, S> IntoIterator for &'a BucketMap<K, V, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, D, O, S> Extend<(K, V)> for BucketMap<K, V, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    /// Keys already present keep their first value.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, D, O, S> FromIterator<(K, V)> for BucketMap<K, V, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

#[cfg(test)]
impl<K, V, D, O, S> BucketMap<K, V, D, O, S>
where
    K: Eq + Hash,
    D: Directory,
    O: Order,
    S: BuildHasher,
{
    /// Checks the directory/store bijection and that every entry is reachable
    /// through its own probe sequence.
    pub(crate) fn assert_invariants(&self) {
        use crate::directory::bucket_index;
        use std::collections::HashMap;

        let n = self.directory.bucket_count();
        if n == 0 {
            assert!(self.entries.is_empty(), "entries without a directory");
            return;
        }
        let mut seen: HashMap<EntryKey, usize> = HashMap::new();
        self.directory.for_each_handle(|bucket, k| {
            let e = self.entries.get(k).expect("directory handle must resolve");
            if !D::OPEN_ADDRESSED {
                assert_eq!(bucket, bucket_index(e.hash, n), "handle in wrong bucket");
            }
            *seen.entry(k).or_insert(0) += 1;
        });
        assert_eq!(seen.len(), self.len(), "directory/store size mismatch");
        assert!(seen.values().all(|&c| c == 1), "handle stored twice");
        for k in self.entries.handles() {
            let hash = self.entries.get(k).map(|e| e.hash).unwrap_or_default();
            match self.directory.probe(hash, |x| x == k) {
                Probe::Found(_, found) => assert_eq!(found, k),
                Probe::Vacant(_) => panic!("entry unreachable from its probe sequence"),
            }
        }
        if D::OPEN_ADDRESSED {
            assert!(self.len() + self.tombstone_count() < n, "no empty slot left");
        }
    }
}

//! Bucket directories: where a key's handle lives for a given hash.
//!
//! A directory never owns entries; it maps `hash mod bucket_count` to
//! [`EntryKey`] handles into the entry store. Two layouts are provided:
//!
//! - [`Chained`]: one vector of handles per bucket. New handles are pushed to
//!   the back and lookups scan from the back, so the newest element of a
//!   chain is compared first.
//! - [`LinearProbing`]: one slot per bucket, `Empty | Tombstone | Occupied`.
//!   Removal leaves a tombstone so probe sequences that ran past the slot stay
//!   intact. At least one slot is always `Empty` while the directory is
//!   allocated, which bounds every probe.
//!
//! Every allocation goes through `try_reserve*` so a failed rebuild can be
//! reported before the container is modified.

use crate::entry_store::{EntryKey, EntryStore, Order};
use std::collections::TryReserveError;

/// Location of a handle (or of the place a new one would go).
///
/// `bucket` is the directory index. `offset` is the position inside a chain
/// and is always 0 for probing slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub(crate) bucket: usize,
    pub(crate) offset: usize,
}

impl Position {
    fn slot(bucket: usize) -> Self {
        Self { bucket, offset: 0 }
    }
}

/// Result of probing a directory for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// The key is stored; its handle sits at the position.
    Found(Position, EntryKey),
    /// The key is absent; a new handle for it belongs at the position.
    Vacant(Position),
}

mod sealed {
    pub trait Sealed {}
}

/// Collision-resolution strategy of a container.
///
/// Implemented by [`Chained`] and [`LinearProbing`]; the trait is sealed.
pub trait Directory: sealed::Sealed + Sized {
    /// Name used in log records.
    const STRATEGY: &'static str;
    /// Open-addressed layouts must keep `len < bucket_count`.
    const OPEN_ADDRESSED: bool;

    /// A directory with no buckets; nothing is allocated.
    fn unallocated() -> Self;

    fn bucket_count(&self) -> usize;

    /// Tombstoned slots; always 0 for chained directories.
    fn tombstones(&self) -> usize;

    /// Walks the probe sequence for `hash`, asking `is_match` about each
    /// handle met on the way. Must not be called on an unallocated directory.
    fn probe(&self, hash: u64, is_match: impl FnMut(EntryKey) -> bool) -> Probe;

    /// Makes sure `occupy(at, _)` will not allocate.
    fn reserve_at(&mut self, at: Position) -> Result<(), TryReserveError>;

    /// Stores `key` at a position previously returned as `Probe::Vacant`.
    fn occupy(&mut self, at: Position, key: EntryKey);

    /// Drops the handle at a position previously returned as `Probe::Found`.
    fn vacate(&mut self, at: Position);

    /// Where a handle for `hash` goes when the key is known to be absent.
    /// Used right after a rebuild, when no equality checks are needed.
    fn vacant_for(&self, hash: u64) -> Position;

    /// Builds a fresh directory of `bucket_count` buckets holding every entry
    /// of `store`, with room reserved for one more handle of hash `pending`.
    fn rebuilt<K, V, O: Order>(
        bucket_count: usize,
        store: &EntryStore<K, V, O>,
        pending: Option<u64>,
    ) -> Result<Self, TryReserveError>;

    /// Visits every live handle with its bucket index.
    fn for_each_handle(&self, f: impl FnMut(usize, EntryKey));
}

#[inline]
pub(crate) fn bucket_index(hash: u64, bucket_count: usize) -> usize {
    (hash % bucket_count as u64) as usize
}

fn alloc_buckets<T>(n: usize, fill: impl FnMut() -> T) -> Result<Vec<T>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)?;
    v.resize_with(n, fill);
    Ok(v)
}

/// Separate chaining: every bucket is a vector of handles.
#[derive(Debug, Clone, Default)]
pub struct Chained {
    buckets: Vec<Vec<EntryKey>>,
}

impl sealed::Sealed for Chained {}

impl Directory for Chained {
    const STRATEGY: &'static str = "chained";
    const OPEN_ADDRESSED: bool = false;

    fn unallocated() -> Self {
        Self {
            buckets: Vec::new(),
        }
    }

    fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn tombstones(&self) -> usize {
        0
    }

    fn probe(&self, hash: u64, mut is_match: impl FnMut(EntryKey) -> bool) -> Probe {
        let bucket = bucket_index(hash, self.buckets.len());
        let chain = &self.buckets[bucket];
        match chain.iter().rposition(|&k| is_match(k)) {
            Some(offset) => Probe::Found(Position { bucket, offset }, chain[offset]),
            None => Probe::Vacant(Position {
                bucket,
                offset: chain.len(),
            }),
        }
    }

    fn reserve_at(&mut self, at: Position) -> Result<(), TryReserveError> {
        self.buckets[at.bucket].try_reserve(1)
    }

    fn occupy(&mut self, at: Position, key: EntryKey) {
        self.buckets[at.bucket].push(key);
    }

    fn vacate(&mut self, at: Position) {
        self.buckets[at.bucket].remove(at.offset);
    }

    fn vacant_for(&self, hash: u64) -> Position {
        let bucket = bucket_index(hash, self.buckets.len());
        Position {
            bucket,
            offset: self.buckets[bucket].len(),
        }
    }

    fn rebuilt<K, V, O: Order>(
        bucket_count: usize,
        store: &EntryStore<K, V, O>,
        pending: Option<u64>,
    ) -> Result<Self, TryReserveError> {
        let mut counts = alloc_buckets(bucket_count, || 0usize)?;
        for (_, hash) in store.hashes() {
            counts[bucket_index(hash, bucket_count)] += 1;
        }
        if let Some(hash) = pending {
            counts[bucket_index(hash, bucket_count)] += 1;
        }

        let mut buckets = alloc_buckets(bucket_count, Vec::new)?;
        for (chain, &n) in buckets.iter_mut().zip(&counts) {
            if n > 0 {
                chain.try_reserve_exact(n)?;
            }
        }
        for (k, hash) in store.hashes() {
            buckets[bucket_index(hash, bucket_count)].push(k);
        }
        Ok(Self { buckets })
    }

    fn for_each_handle(&self, mut f: impl FnMut(usize, EntryKey)) {
        for (i, chain) in self.buckets.iter().enumerate() {
            for &k in chain {
                f(i, k);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    Tombstone,
    Occupied(EntryKey),
}

/// Open addressing with linear probing and lazy (tombstone) deletion.
#[derive(Debug, Clone, Default)]
pub struct LinearProbing {
    slots: Vec<Slot>,
    tombstones: usize,
}

impl sealed::Sealed for LinearProbing {}

impl LinearProbing {
    /// First non-occupied slot on the probe path of `hash`.
    fn first_free(&self, hash: u64) -> usize {
        let n = self.slots.len();
        let mut i = bucket_index(hash, n);
        for _ in 0..n {
            if !matches!(self.slots[i], Slot::Occupied(_)) {
                return i;
            }
            i = (i + 1) % n;
        }
        unreachable!("linear probing directory has no free slot")
    }
}

impl Directory for LinearProbing {
    const STRATEGY: &'static str = "linear-probing";
    const OPEN_ADDRESSED: bool = true;

    fn unallocated() -> Self {
        Self {
            slots: Vec::new(),
            tombstones: 0,
        }
    }

    fn bucket_count(&self) -> usize {
        self.slots.len()
    }

    fn tombstones(&self) -> usize {
        self.tombstones
    }

    fn probe(&self, hash: u64, mut is_match: impl FnMut(EntryKey) -> bool) -> Probe {
        let n = self.slots.len();
        let mut i = bucket_index(hash, n);
        let mut reusable = None;
        for _ in 0..n {
            match self.slots[i] {
                Slot::Empty => return Probe::Vacant(Position::slot(reusable.unwrap_or(i))),
                Slot::Tombstone => {
                    reusable.get_or_insert(i);
                }
                Slot::Occupied(k) => {
                    if is_match(k) {
                        return Probe::Found(Position::slot(i), k);
                    }
                }
            }
            i = (i + 1) % n;
        }
        match reusable {
            Some(i) => Probe::Vacant(Position::slot(i)),
            None => unreachable!("linear probing directory has no free slot"),
        }
    }

    fn reserve_at(&mut self, _at: Position) -> Result<(), TryReserveError> {
        Ok(())
    }

    fn occupy(&mut self, at: Position, key: EntryKey) {
        let slot = &mut self.slots[at.bucket];
        debug_assert!(!matches!(slot, Slot::Occupied(_)));
        if *slot == Slot::Tombstone {
            self.tombstones -= 1;
        }
        *slot = Slot::Occupied(key);
    }

    fn vacate(&mut self, at: Position) {
        let slot = &mut self.slots[at.bucket];
        debug_assert!(matches!(slot, Slot::Occupied(_)));
        *slot = Slot::Tombstone;
        self.tombstones += 1;
    }

    fn vacant_for(&self, hash: u64) -> Position {
        Position::slot(self.first_free(hash))
    }

    fn rebuilt<K, V, O: Order>(
        bucket_count: usize,
        store: &EntryStore<K, V, O>,
        _pending: Option<u64>,
    ) -> Result<Self, TryReserveError> {
        debug_assert!(store.len() < bucket_count);
        let mut dir = Self {
            slots: alloc_buckets(bucket_count, || Slot::Empty)?,
            tombstones: 0,
        };
        for (k, hash) in store.hashes() {
            let i = dir.first_free(hash);
            dir.slots[i] = Slot::Occupied(k);
        }
        Ok(dir)
    }

    fn for_each_handle(&self, mut f: impl FnMut(usize, EntryKey)) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied(k) = *slot {
                f(i, k);
            }
        }
    }
}

#[cfg(test)]
impl LinearProbing {
    pub(crate) fn slot_of(&self, key: EntryKey) -> Option<usize> {
        self.slots.iter().position(|s| *s == Slot::Occupied(key))
    }
}

//! Entry store: the authoritative arena of `(key, value)` pairs.
//!
//! Entries live in a generational `SlotMap`; buckets refer to them by
//! [`EntryKey`] only, so a stale handle fails to resolve instead of aliasing a
//! newer entry. Each entry caches its hash so rebuilding the directory never
//! calls back into `K: Hash`.
//!
//! With the [`InsertionOrder`] policy the store also threads a doubly linked
//! list through its entries. New entries go to the tail and removal unlinks in
//! O(1), so survivors keep their relative order. With [`Unordered`] the links
//! stay empty and iteration follows arena order.

use core::marker::PhantomData;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Generation-checked handle to an entry in the store.
    pub struct EntryKey;
}

mod sealed {
    pub trait Sealed {}
}

/// Iteration-order policy of a container.
pub trait Order: sealed::Sealed + 'static {
    /// Whether iteration follows insertion order.
    const PRESERVES_INSERTION: bool;
}

/// Iteration follows storage order; no linking overhead.
#[derive(Debug, Clone, Copy)]
pub enum Unordered {}

/// Iteration yields entries from oldest to newest surviving insertion.
#[derive(Debug, Clone, Copy)]
pub enum InsertionOrder {}

impl sealed::Sealed for Unordered {}
impl sealed::Sealed for InsertionOrder {}

impl Order for Unordered {
    const PRESERVES_INSERTION: bool = false;
}

impl Order for InsertionOrder {
    const PRESERVES_INSERTION: bool = true;
}

#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    prev: Option<EntryKey>,
    next: Option<EntryKey>,
}

#[derive(Debug)]
pub struct EntryStore<K, V, O> {
    slots: SlotMap<EntryKey, Entry<K, V>>,
    head: Option<EntryKey>,
    tail: Option<EntryKey>,
    _order: PhantomData<fn() -> O>,
}

impl<K, V, O: Order> EntryStore<K, V, O> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
            _order: PhantomData,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub(crate) fn get(&self, k: EntryKey) -> Option<&Entry<K, V>> {
        self.slots.get(k)
    }

    pub(crate) fn get_mut(&mut self, k: EntryKey) -> Option<&mut Entry<K, V>> {
        self.slots.get_mut(k)
    }

    /// Whether `k` names a live entry whose cached hash is `hash` and whose
    /// key satisfies `eq`.
    #[inline]
    pub(crate) fn matches(&self, k: EntryKey, hash: u64, eq: impl FnOnce(&K) -> bool) -> bool {
        self.slots
            .get(k)
            .map(|e| e.hash == hash && eq(&e.key))
            .unwrap_or(false)
    }

    /// Appends an entry; in insertion-order mode it becomes the newest.
    pub(crate) fn insert(&mut self, key: K, value: V, hash: u64) -> EntryKey {
        let prev = if O::PRESERVES_INSERTION { self.tail } else { None };
        let k = self.slots.insert(Entry {
            key,
            value,
            hash,
            prev,
            next: None,
        });
        if O::PRESERVES_INSERTION {
            match prev {
                Some(p) => self.slots[p].next = Some(k),
                None => self.head = Some(k),
            }
            self.tail = Some(k);
        }
        k
    }

    /// Removes an entry, splicing its neighbours together.
    pub(crate) fn remove(&mut self, k: EntryKey) -> Option<(K, V)> {
        let entry = self.slots.remove(k)?;
        if O::PRESERVES_INSERTION {
            match entry.prev {
                Some(p) => self.slots[p].next = entry.next,
                None => self.head = entry.next,
            }
            match entry.next {
                Some(n) => self.slots[n].prev = entry.prev,
                None => self.tail = entry.prev,
            }
        }
        Some((entry.key, entry.value))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    /// `(handle, cached hash)` for every entry, in iteration order.
    pub(crate) fn hashes(&self) -> impl Iterator<Item = (EntryKey, u64)> + '_ {
        self.handles().map(move |k| (k, self.slots[k].hash))
    }

    /// Every live handle, in iteration order.
    pub(crate) fn handles(&self) -> Handles<'_, K, V> {
        if O::PRESERVES_INSERTION {
            Handles::Linked {
                slots: &self.slots,
                next: self.head,
            }
        } else {
            Handles::Arena(self.slots.keys())
        }
    }

    pub(crate) fn slots(&self) -> &SlotMap<EntryKey, Entry<K, V>> {
        &self.slots
    }

    #[cfg(test)]
    pub(crate) fn head(&self) -> Option<EntryKey> {
        self.head
    }
}

impl<K: Clone, V: Clone, O> Clone for EntryStore<K, V, O> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            head: self.head,
            tail: self.tail,
            _order: PhantomData,
        }
    }
}

/// Handle walk used by rebuilds and iterators.
pub(crate) enum Handles<'a, K, V> {
    Arena(slotmap::basic::Keys<'a, EntryKey, Entry<K, V>>),
    Linked {
        slots: &'a SlotMap<EntryKey, Entry<K, V>>,
        next: Option<EntryKey>,
    },
}

impl<K, V> Iterator for Handles<'_, K, V> {
    type Item = EntryKey;

    fn next(&mut self) -> Option<EntryKey> {
        match self {
            Handles::Arena(keys) => keys.next(),
            Handles::Linked { slots, next } => {
                let k = (*next)?;
                *next = slots.get(k).and_then(|e| e.next);
                Some(k)
            }
        }
    }
}

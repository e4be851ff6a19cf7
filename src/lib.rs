//! bucket-map: a single-threaded hash map and set with pluggable collision
//! resolution (separate chaining or linear probing) and optional
//! insertion-order iteration.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: one generic container instead of a family of hand-copied
//!   variants. Collision strategy and iteration order are type parameters.
//! - Layers:
//!   - EntryStore<K, V, O>: generational arena (`slotmap`) that owns every
//!     `(key, value)` and caches each key's hash. With `InsertionOrder` it
//!     also threads a doubly linked list through the entries.
//!   - Directory (`Chained` | `LinearProbing`): maps `hash mod bucket_count`
//!     to entry handles. Holds handles only, never entries.
//!   - resize: decides when a directory must grow or be compacted and
//!     builds the replacement.
//!   - BucketMap<K, V, D, O, S>: public API combining the three; BucketSet
//!     is a thin wrapper over `BucketMap<K, ()>`.
//!
//! Constraints
//! - Unique keys; inserting an existing key returns `false` and leaves the
//!   stored value alone.
//! - Every stored entry has exactly one handle in the directory and every
//!   handle resolves to a live entry.
//! - The directory is allocated lazily by the first insert, grows by 2x when
//!   `len / bucket_count >= max_load_factor`, and never shrinks.
//! - Linear probing removes lazily with tombstones. Tombstones are purged by a
//!   same-size rebuild once they reach `max_tombstone_ratio` of the slots, and
//!   at least one empty slot always terminates a probe.
//!
//! Failure boundaries
//! - Every directory allocation is fallible (`try_reserve*`) and happens
//!   before the entry store is touched, so `try_insert`/`resize` roll back
//!   cleanly with `Error::AllocationFailure`.
//! - Lookups of absent keys are `Error::KeyNotFound` from `get`/`get_mut`;
//!   `contains_key` and `remove` report absence as `false`.
//!
//! Hasher and rehashing invariants
//! - Each entry stores its `u64` hash and rebuilds index with the stored
//!   hash; `K: Hash` is never invoked after insertion.
//!
//! Reentrancy
//! - User code runs while hashing and while comparing keys during a probe. A
//!   debug-only guard panics if that code re-enters the same container.
//!
//! Notes and non-goals
//! - Single-threaded. Containers are `Send` when `K`, `V` and `S` are, and
//!   never `Sync`, in debug and release builds alike:
//!
//! ```
//! fn assert_send<T: Send>() {}
//! assert_send::<bucket_map::ChainedMap<u32, String>>();
//! assert_send::<bucket_map::ProbingSet<u64>>();
//! ```
//!
//! ```compile_fail
//! fn assert_sync<T: Sync>() {}
//! assert_sync::<bucket_map::ChainedMap<u32, u32>>();
//! ```
//! - No persistence or serialization, no sorted iteration.
//! - Keys are immutable post-insert; only values are reachable mutably.

mod config;
mod directory;
mod entry_store;
mod error;
mod iter;
mod map;
#[cfg(test)]
mod map_proptest;
mod reentrancy;
mod resize;
mod set;

pub use config::{
    Config, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD_FACTOR, DEFAULT_MAX_TOMBSTONE_RATIO, GROWTH_FACTOR,
};
pub use directory::{Chained, Directory, LinearProbing};
pub use entry_store::{InsertionOrder, Order, Unordered};
pub use error::Error;
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use iter::{Iter, Keys, Values};
pub use map::BucketMap;
pub use set::BucketSet;

/// Separate chaining, arena iteration order.
pub type ChainedMap<K, V, S = DefaultHashBuilder> = BucketMap<K, V, Chained, Unordered, S>;
/// Separate chaining, iteration from oldest to newest insertion.
pub type OrderedMap<K, V, S = DefaultHashBuilder> = BucketMap<K, V, Chained, InsertionOrder, S>;
/// Linear probing with tombstones, arena iteration order.
pub type ProbingMap<K, V, S = DefaultHashBuilder> = BucketMap<K, V, LinearProbing, Unordered, S>;

pub type ChainedSet<K, S = DefaultHashBuilder> = BucketSet<K, Chained, Unordered, S>;
pub type OrderedSet<K, S = DefaultHashBuilder> = BucketSet<K, Chained, InsertionOrder, S>;
pub type ProbingSet<K, S = DefaultHashBuilder> = BucketSet<K, LinearProbing, Unordered, S>;

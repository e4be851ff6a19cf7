//! Resize coordinator: decides when a directory must be rebuilt and builds
//! the replacement.
//!
//! Growth is keyed to the load factor observed after an insert. Directories
//! never shrink. Open-addressed directories are also compacted (rebuilt at
//! the same size) when tombstones pile up or when an insert would leave no
//! empty slot to terminate a probe. A compaction that would leave more than
//! half the slots live grows instead, so a same-size rebuild always leaves at
//! least half the table empty.

use crate::config::{Config, GROWTH_FACTOR};
use crate::directory::Directory;
use crate::entry_store::{EntryStore, Order};
use std::collections::TryReserveError;

/// A planned rebuild and the bucket count it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rebuild {
    /// First insert into an unallocated directory.
    Initial(usize),
    /// Load factor reached the threshold.
    Grow(usize),
    /// Same size, drop tombstones.
    Compact(usize),
    /// Caller asked for at least this many buckets.
    Explicit(usize),
}

impl Rebuild {
    pub(crate) fn bucket_count(self) -> usize {
        match self {
            Rebuild::Initial(n)
            | Rebuild::Grow(n)
            | Rebuild::Compact(n)
            | Rebuild::Explicit(n) => n,
        }
    }

    fn reason(self) -> &'static str {
        match self {
            Rebuild::Initial(_) => "initial allocation",
            Rebuild::Grow(_) => "load factor reached",
            Rebuild::Compact(_) => "tombstone compaction",
            Rebuild::Explicit(_) => "explicit resize",
        }
    }
}

/// Rebuild needed once the directory holds `len_after` entries, if any.
///
/// `buckets` must be non-zero; lazy initialization happens before planning.
pub(crate) fn plan_after_insert<D: Directory>(
    config: &Config,
    len_after: usize,
    buckets: usize,
    tombstones: usize,
) -> Option<Rebuild> {
    debug_assert!(buckets > 0);
    let load = len_after as f64 / buckets as f64;
    if load >= config.max_load_factor() || (D::OPEN_ADDRESSED && len_after >= buckets) {
        return Some(Rebuild::Grow(buckets.saturating_mul(GROWTH_FACTOR)));
    }
    if D::OPEN_ADDRESSED && tombstones > 0 {
        let ratio = tombstones as f64 / buckets as f64;
        if ratio >= config.max_tombstone_ratio() || len_after + tombstones >= buckets {
            if len_after > buckets / 2 {
                return Some(Rebuild::Grow(buckets.saturating_mul(GROWTH_FACTOR)));
            }
            return Some(Rebuild::Compact(buckets));
        }
    }
    None
}

/// Directory for the first insert: `initial_capacity` buckets, or already the
/// grown size when one entry would reach the threshold.
pub(crate) fn plan_initial<D: Directory>(config: &Config) -> Rebuild {
    let n = config.initial_capacity();
    plan_after_insert::<D>(config, 1, n, 0).unwrap_or(Rebuild::Initial(n))
}

/// Target for an explicit `resize(requested)`; `None` when nothing changes.
pub(crate) fn plan_explicit<D: Directory>(
    requested: usize,
    len: usize,
    buckets: usize,
    tombstones: usize,
) -> Option<Rebuild> {
    let mut target = requested.max(buckets);
    if D::OPEN_ADDRESSED && target <= len {
        target = len + 1;
    }
    if target == 0 || (target == buckets && tombstones == 0) {
        return None;
    }
    Some(Rebuild::Explicit(target))
}

/// Builds the directory described by `plan`, reserving room for a pending
/// handle. The current directory is left untouched; on error nothing changed.
pub(crate) fn rebuild<D: Directory, K, V, O: Order>(
    current: &D,
    store: &EntryStore<K, V, O>,
    plan: Rebuild,
    pending: Option<u64>,
) -> Result<D, TryReserveError> {
    let to = plan.bucket_count();
    match D::rebuilt(to, store, pending) {
        Ok(dir) => {
            log::debug!(
                "rebuilt {} directory: {} -> {} buckets ({} entries, {} tombstones dropped, {})",
                D::STRATEGY,
                current.bucket_count(),
                to,
                store.len(),
                current.tombstones(),
                plan.reason(),
            );
            Ok(dir)
        }
        Err(e) => {
            log::debug!(
                "{} directory rebuild to {} buckets failed: {}",
                D::STRATEGY,
                to,
                e
            );
            Err(e)
        }
    }
}

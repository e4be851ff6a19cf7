//! Construction parameters and resize constants.

use crate::error::Error;

/// Bucket count established by the first insert when none is configured.
pub const DEFAULT_CAPACITY: usize = 16;
/// Load factor at which the directory grows.
pub const DEFAULT_MAX_LOAD_FACTOR: f64 = 0.7;
/// Share of tombstoned slots that triggers a same-size rebuild in probing mode.
pub const DEFAULT_MAX_TOMBSTONE_RATIO: f64 = 0.25;
/// Multiplier applied to the bucket count on growth.
pub const GROWTH_FACTOR: usize = 2;

/// Sizing policy for a [`BucketMap`](crate::BucketMap).
///
/// ```
/// use bucket_map::{Config, OrderedMap};
///
/// let config = Config::new().with_initial_capacity(4).with_max_load_factor(0.5);
/// let map: OrderedMap<u32, &str> = OrderedMap::with_config(config).unwrap();
/// assert_eq!(map.bucket_count(), 0); // allocated on first insert
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    initial_capacity: usize,
    max_load_factor: f64,
    max_tombstone_ratio: f64,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            max_tombstone_ratio: DEFAULT_MAX_TOMBSTONE_RATIO,
        }
    }

    /// Bucket count allocated by the first insert and after `clear`.
    pub const fn with_initial_capacity(mut self, buckets: usize) -> Self {
        self.initial_capacity = buckets;
        self
    }

    /// Growth threshold for `len / bucket_count`.
    pub const fn with_max_load_factor(mut self, load_factor: f64) -> Self {
        self.max_load_factor = load_factor;
        self
    }

    /// Tombstone share that forces a compaction in probing mode.
    pub const fn with_max_tombstone_ratio(mut self, ratio: f64) -> Self {
        self.max_tombstone_ratio = ratio;
        self
    }

    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub fn max_load_factor(&self) -> f64 {
        self.max_load_factor
    }

    pub fn max_tombstone_ratio(&self) -> f64 {
        self.max_tombstone_ratio
    }

    /// Rejects settings under which the resize policy cannot work.
    ///
    /// NaN never compares greater than zero, so it is rejected along with
    /// non-positive values.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.max_load_factor > 0.0) || self.max_load_factor.is_infinite() {
            return Err(Error::InvalidConfiguration(format!(
                "max_load_factor must be positive and finite, got {}",
                self.max_load_factor
            )));
        }
        if self.initial_capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "initial_capacity must be at least 1".to_string(),
            ));
        }
        if !(self.max_tombstone_ratio > 0.0 && self.max_tombstone_ratio <= 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "max_tombstone_ratio must be in (0, 1], got {}",
                self.max_tombstone_ratio
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

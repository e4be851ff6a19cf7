//! Error type shared by every container in the crate.

use std::collections::TryReserveError;

/// Failures reported by [`BucketMap`](crate::BucketMap) and
/// [`BucketSet`](crate::BucketSet).
///
/// Inserting a key that is already present is not an error; `insert` reports
/// it by returning `false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `get`/`get_mut` was called with a key that is not stored.
    #[error("key not found")]
    KeyNotFound,
    /// The container was configured with values it cannot honor.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Growing the bucket directory failed; the container is unchanged.
    #[error("allocation failure: {0}")]
    AllocationFailure(#[from] TryReserveError),
}

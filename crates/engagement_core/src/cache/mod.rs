//! Active-item counter cache.
//!
//! # Responsibility
//! - Define the counter store contract used for capacity checks.
//! - Name cache keys per `(user, kind)`.
//!
//! # Invariants
//! - The cache is a hint; join edges in storage are the source of truth.
//! - A `get` miss (`Ok(None)`) obliges the caller to recompute from storage
//!   and `set` the result.
//! - `increment` is not idempotent and must not be retried blindly.

mod memory;

pub use memory::InMemoryCounterCache;

use crate::model::kind::ShareableKind;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CacheResult<T> = Result<T, CacheError>;

/// Counter cache failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Backend cannot be reached. Callers degrade to recomputation.
    Unavailable(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "counter cache unavailable: {message}"),
        }
    }
}

impl Error for CacheError {}

/// Cache key for one user's active count of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CounterKey {
    pub user_id: String,
    pub kind: ShareableKind,
}

impl CounterKey {
    pub fn new(user_id: impl Into<String>, kind: ShareableKind) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
        }
    }
}

impl Display for CounterKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:active_{}:count", self.user_id, self.kind.as_str())
    }
}

/// Key/value counter store.
pub trait CounterCache: Send + Sync {
    /// Returns the cached value, or `None` on a miss.
    fn get(&self, key: &CounterKey) -> CacheResult<Option<i64>>;
    /// Overwrites the cached value.
    fn set(&self, key: &CounterKey, value: i64) -> CacheResult<()>;
    /// Adds one and returns the new value. A missing key starts from zero.
    fn increment(&self, key: &CounterKey) -> CacheResult<i64>;
    /// Drops the cached value so the next read recomputes it.
    fn invalidate(&self, key: &CounterKey) -> CacheResult<()>;
}

#[cfg(test)]
mod tests {
    use super::CounterKey;
    use crate::model::kind::ShareableKind;

    #[test]
    fn key_renders_user_kind_and_suffix() {
        let key = CounterKey::new("user-7", ShareableKind::Habit);
        assert_eq!(key.to_string(), "user-7:active_habit:count");
    }
}

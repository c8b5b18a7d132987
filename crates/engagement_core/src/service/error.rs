//! Service-level error taxonomy.

use crate::cache::CacheError;
use crate::catalog::CatalogError;
use crate::model::kind::ShareableKind;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EngagementResult<T> = Result<T, EngagementError>;

/// Errors surfaced by engagement use-cases.
#[derive(Debug)]
pub enum EngagementError {
    /// Item is neither shared with the user nor discoverable in their org.
    NotFound { kind: ShareableKind, item_id: String },
    /// User already holds `limit` active items of this kind.
    CapacityExceeded {
        kind: ShareableKind,
        limit: u32,
        active: i64,
    },
    /// Catalog item carries a malformed ISO-8601 duration.
    InvalidDuration {
        kind: ShareableKind,
        item_id: String,
        value: String,
    },
    /// Signup requested for a kind without join edges.
    NotJoinable(ShareableKind),
    /// Caller input rejected before any state change.
    InvalidRequest(String),
    /// Persistent store failure. The operation did not complete.
    StoreUnavailable(RepoError),
    /// Counter cache failure on a path that cannot degrade.
    CacheUnavailable(CacheError),
    /// Item catalog failure.
    Catalog(CatalogError),
}

impl Display for EngagementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, item_id } => write!(f, "{kind} not found: {item_id}"),
            Self::CapacityExceeded {
                kind,
                limit,
                active,
            } => write!(
                f,
                "{kind} capacity exceeded: {active} active of {limit} allowed"
            ),
            Self::InvalidDuration {
                kind,
                item_id,
                value,
            } => write!(f, "{kind} {item_id} has invalid duration `{value}`"),
            Self::NotJoinable(kind) => write!(f, "{kind} items cannot be joined"),
            Self::InvalidRequest(message) => write!(f, "invalid request: {message}"),
            Self::StoreUnavailable(err) => write!(f, "store unavailable: {err}"),
            Self::CacheUnavailable(err) => write!(f, "{err}"),
            Self::Catalog(err) => write!(f, "{err}"),
        }
    }
}

impl Error for EngagementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreUnavailable(err) => Some(err),
            Self::CacheUnavailable(err) => Some(err),
            Self::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for EngagementError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::InvalidRequest(err.to_string()),
            other => Self::StoreUnavailable(other),
        }
    }
}

impl From<CatalogError> for EngagementError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<CacheError> for EngagementError {
    fn from(value: CacheError) -> Self {
        Self::CacheUnavailable(value)
    }
}

//! Item catalog collaborators.
//!
//! # Responsibility
//! - Define the lookup contract for goal/challenge/habit (behaviour) and
//!   plan/survey/content items owned by external domain services.
//! - Route lookups to the catalog registered for each kind.
//!
//! # Invariants
//! - One catalog per `ShareableKind`.
//! - Catalog items are read-only from this crate's perspective.

mod registry;
mod static_catalog;

pub use registry::CatalogRegistry;
pub use static_catalog::StaticCatalog;

use crate::model::kind::ShareableKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog lookup and registration failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    NotRegistered(ShareableKind),
    DuplicateKind(ShareableKind),
    KindMismatch {
        expected: ShareableKind,
        actual: ShareableKind,
    },
    Unavailable(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRegistered(kind) => write!(f, "no catalog registered for `{kind}`"),
            Self::DuplicateKind(kind) => write!(f, "catalog already registered for `{kind}`"),
            Self::KindMismatch { expected, actual } => {
                write!(f, "catalog item kind `{actual}` does not match `{expected}`")
            }
            Self::Unavailable(message) => write!(f, "catalog unavailable: {message}"),
        }
    }
}

impl Error for CatalogError {}

/// Item metadata supplied by a domain catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub kind: ShareableKind,
    /// Owning organisation. `None` means visible to every organisation.
    pub org_id: Option<String>,
    pub title: String,
    pub image: Option<String>,
    pub summary: Option<String>,
    /// ISO-8601 duration, e.g. `P30D`.
    pub duration: String,
    pub target_value: Option<i64>,
}

/// Display projection of a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetails {
    pub title: String,
    pub image: Option<String>,
    pub summary: Option<String>,
    pub duration: String,
}

impl CatalogItem {
    pub fn details(&self) -> ItemDetails {
        ItemDetails {
            title: self.title.clone(),
            image: self.image.clone(),
            summary: self.summary.clone(),
            duration: self.duration.clone(),
        }
    }

    /// Whether members of `org_id` can discover this item unshared.
    pub fn visible_to_org(&self, org_id: Option<&str>) -> bool {
        match (self.org_id.as_deref(), org_id) {
            (None, _) => true,
            (Some(owner), Some(requested)) => owner == requested,
            (Some(_), None) => false,
        }
    }
}

/// Lookup contract implemented by every domain catalog.
pub trait ItemCatalog: Send + Sync {
    /// Kind served by this catalog.
    fn kind(&self) -> ShareableKind;
    /// Loads one item by id.
    fn get_item(&self, item_id: &str) -> CatalogResult<Option<CatalogItem>>;
}

//! Per-kind catalog registry.

use super::{CatalogError, CatalogItem, CatalogResult, ItemCatalog};
use crate::model::kind::ShareableKind;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Runtime catalog registry keyed by item kind.
#[derive(Default, Clone)]
pub struct CatalogRegistry {
    catalogs: BTreeMap<ShareableKind, Arc<dyn ItemCatalog>>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one catalog under the kind it reports.
    pub fn register(&mut self, catalog: Arc<dyn ItemCatalog>) -> CatalogResult<()> {
        let kind = catalog.kind();
        if self.catalogs.contains_key(&kind) {
            return Err(CatalogError::DuplicateKind(kind));
        }
        self.catalogs.insert(kind, catalog);
        Ok(())
    }

    /// Returns sorted registered kinds.
    pub fn kinds(&self) -> Vec<ShareableKind> {
        self.catalogs.keys().copied().collect()
    }

    pub fn catalog(&self, kind: ShareableKind) -> CatalogResult<&dyn ItemCatalog> {
        self.catalogs
            .get(&kind)
            .map(|catalog| catalog.as_ref())
            .ok_or(CatalogError::NotRegistered(kind))
    }

    /// Loads one item from the catalog registered for `kind`.
    ///
    /// Rejects items whose reported kind differs from the requested one.
    pub fn get_item(
        &self,
        kind: ShareableKind,
        item_id: &str,
    ) -> CatalogResult<Option<CatalogItem>> {
        let Some(item) = self.catalog(kind)?.get_item(item_id)? else {
            return Ok(None);
        };
        if item.kind != kind {
            return Err(CatalogError::KindMismatch {
                expected: kind,
                actual: item.kind,
            });
        }
        Ok(Some(item))
    }
}

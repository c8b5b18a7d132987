//! In-process catalog backed by a locked map.

use super::{CatalogError, CatalogItem, CatalogResult, ItemCatalog};
use crate::model::kind::ShareableKind;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Fixed item set for one kind, loaded by the host process.
#[derive(Debug)]
pub struct StaticCatalog {
    kind: ShareableKind,
    items: RwLock<BTreeMap<String, CatalogItem>>,
}

impl StaticCatalog {
    pub fn new(kind: ShareableKind) -> Self {
        Self {
            kind,
            items: RwLock::new(BTreeMap::new()),
        }
    }

    /// Inserts or replaces one item. The item kind must match the catalog.
    pub fn insert(&self, item: CatalogItem) -> CatalogResult<()> {
        if item.kind != self.kind {
            return Err(CatalogError::KindMismatch {
                expected: self.kind,
                actual: item.kind,
            });
        }
        let mut items = self
            .items
            .write()
            .map_err(|_| CatalogError::Unavailable("static catalog lock poisoned".to_string()))?;
        items.insert(item.id.clone(), item);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.read().map_or(0, |items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ItemCatalog for StaticCatalog {
    fn kind(&self) -> ShareableKind {
        self.kind
    }

    fn get_item(&self, item_id: &str) -> CatalogResult<Option<CatalogItem>> {
        let items = self
            .items
            .read()
            .map_err(|_| CatalogError::Unavailable("static catalog lock poisoned".to_string()))?;
        Ok(items.get(item_id).cloned())
    }
}

#![allow(dead_code)]

use engagement_core::catalog::{CatalogItem, CatalogRegistry, StaticCatalog};
use engagement_core::config::{ActiveLimits, InboxConfig};
use engagement_core::db::open_db_in_memory;
use engagement_core::repo::join_repo::SqliteJoinRepository;
use engagement_core::repo::pending_repo::SqlitePendingRepository;
use engagement_core::repo::share_repo::SqliteShareRepository;
use engagement_core::service::join_coordinator::JoinCoordinator;
use engagement_core::service::pending_inbox::PendingActionInbox;
use engagement_core::service::share_ledger::ShareStatusLedger;
use engagement_core::service::share_service::{ShareRequest, ShareService};
use engagement_core::{CounterCache, InMemoryCounterCache, ShareEdge, ShareableKind};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 2024-01-01T00:00:00Z
pub const T0: i64 = 1_704_067_200_000;
pub const HOUR_MS: i64 = 3_600_000;

pub type SqliteCoordinator<'a> = JoinCoordinator<
    'a,
    SqliteJoinRepository<'a>,
    SqliteShareRepository<'a>,
    SqlitePendingRepository<'a>,
>;

pub struct Catalogs {
    pub registry: CatalogRegistry,
    stores: BTreeMap<ShareableKind, Arc<StaticCatalog>>,
}

impl Catalogs {
    pub fn new() -> Self {
        let mut registry = CatalogRegistry::new();
        let mut stores = BTreeMap::new();
        for kind in ShareableKind::ALL {
            let catalog = Arc::new(StaticCatalog::new(kind));
            registry.register(catalog.clone()).unwrap();
            stores.insert(kind, catalog);
        }
        Self { registry, stores }
    }

    pub fn add(&self, item: CatalogItem) {
        self.stores[&item.kind].insert(item).unwrap();
    }
}

pub fn item(kind: ShareableKind, id: &str, org_id: Option<&str>, duration: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        kind,
        org_id: org_id.map(str::to_string),
        title: format!("{kind} {id}"),
        image: Some(format!("https://img.example/{id}.png")),
        summary: None,
        duration: duration.to_string(),
        target_value: Some(10),
    }
}

pub fn open() -> Connection {
    open_db_in_memory().unwrap()
}

pub fn coordinator<'a>(
    conn: &'a Connection,
    counters: &'a dyn CounterCache,
    catalogs: &'a CatalogRegistry,
    limits: ActiveLimits,
) -> SqliteCoordinator<'a> {
    JoinCoordinator::new(
        SqliteJoinRepository::try_new(conn).unwrap(),
        ShareStatusLedger::new(SqliteShareRepository::try_new(conn).unwrap()),
        PendingActionInbox::new(
            SqlitePendingRepository::try_new(conn).unwrap(),
            catalogs,
            InboxConfig::default(),
        ),
        counters,
        catalogs,
        limits,
    )
}

pub fn memory_cache() -> InMemoryCounterCache {
    InMemoryCounterCache::new()
}

pub fn share(
    conn: &Connection,
    catalogs: &CatalogRegistry,
    kind: ShareableKind,
    item_id: &str,
    sharer_id: &str,
    recipient_id: &str,
    at_ms: i64,
) -> ShareEdge {
    let request = ShareRequest {
        sharer_id: sharer_id.to_string(),
        recipients: vec![recipient_id.to_string()],
        kind,
        item_id: item_id.to_string(),
        org_id: Some("org-1".to_string()),
    };
    ShareService::new(SqliteShareRepository::try_new(conn).unwrap(), catalogs)
        .share_item(&request, at_ms)
        .unwrap()
        .remove(0)
}

//! Engagement use-case services.
//!
//! # Responsibility
//! - Orchestrate repositories, the counter cache and item catalogs into the
//!   join, inbox, share-status and read-path use-cases.
//! - Keep callers decoupled from storage details.
//!
//! # Invariants
//! - Join edges are the durable truth; counters are hints that self-heal on
//!   the next cache miss.
//! - Services hold collaborators by injection, never through globals.

pub mod engagement_query;
pub mod error;
pub mod join_coordinator;
pub mod pending_inbox;
pub mod share_ledger;
pub mod share_service;

use crate::catalog::{CatalogError, CatalogRegistry, ItemDetails};
use crate::model::kind::ShareableKind;
use error::EngagementResult;
use log::warn;

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Resolves display fields for a stored item link.
///
/// Missing items and unregistered kinds yield `None`; the stored link stays
/// visible without enrichment.
pub(crate) fn lookup_details(
    catalogs: &CatalogRegistry,
    kind: ShareableKind,
    item_id: &str,
) -> EngagementResult<Option<ItemDetails>> {
    match catalogs.get_item(kind, item_id) {
        Ok(Some(item)) => Ok(Some(item.details())),
        Ok(None) => {
            warn!(
                "event=catalog_lookup module=service status=missing kind={kind} item_id={item_id}"
            );
            Ok(None)
        }
        Err(CatalogError::NotRegistered(_)) => {
            warn!(
                "event=catalog_lookup module=service status=unregistered kind={kind} item_id={item_id}"
            );
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

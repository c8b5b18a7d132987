//! Pending action inbox use-cases.
//!
//! # Responsibility
//! - Page through a recipient's undisposed shares within a time window.
//! - Enrich each row from the catalog of its item kind at read time.
//! - Dispose rows on join or explicit dismissal.
//!
//! # Invariants
//! - Display fields are never stored on inbox rows.
//! - `remove` is idempotent.

use crate::catalog::{CatalogRegistry, ItemDetails};
use crate::config::InboxConfig;
use crate::model::pending::{PendingAction, SortOrder};
use crate::repo::pending_repo::{PendingQuery, PendingRepository};
use crate::service::error::{EngagementError, EngagementResult};
use crate::service::lookup_details;
use log::debug;

/// Inbox listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingListRequest {
    pub user_id: String,
    pub org_id: Option<String>,
    pub offset: u32,
    /// Requested page size; normalized against the inbox config.
    pub limit: Option<u32>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub sort: SortOrder,
}

/// Inbox row with catalog display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActionView {
    pub action: PendingAction,
    /// `None` when the catalog no longer knows the item.
    pub details: Option<ItemDetails>,
}

/// Inbox page envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPage {
    pub items: Vec<PendingActionView>,
    pub applied_limit: u32,
}

/// Pending inbox facade over repository and catalogs.
pub struct PendingActionInbox<'a, R: PendingRepository> {
    repo: R,
    catalogs: &'a CatalogRegistry,
    paging: InboxConfig,
}

impl<'a, R: PendingRepository> PendingActionInbox<'a, R> {
    pub fn new(repo: R, catalogs: &'a CatalogRegistry, paging: InboxConfig) -> Self {
        Self {
            repo,
            catalogs,
            paging,
        }
    }

    /// Lists one page of the inbox, enriched per item kind.
    pub fn list(&self, request: &PendingListRequest) -> EngagementResult<PendingPage> {
        if let (Some(from_ms), Some(to_ms)) = (request.from_ms, request.to_ms) {
            if from_ms > to_ms {
                return Err(EngagementError::InvalidRequest(format!(
                    "time window start {from_ms} is after end {to_ms}"
                )));
            }
        }

        let applied_limit = self.paging.normalize_limit(request.limit);
        let query = PendingQuery {
            recipient_id: request.user_id.clone(),
            org_id: request.org_id.clone(),
            offset: request.offset,
            limit: applied_limit,
            from_ms: request.from_ms,
            to_ms: request.to_ms,
            sort: request.sort,
        };

        let items = self
            .repo
            .list_pending(&query)?
            .into_iter()
            .map(|action| {
                let details = lookup_details(self.catalogs, action.kind, &action.item_id)?;
                Ok(PendingActionView { action, details })
            })
            .collect::<EngagementResult<Vec<_>>>()?;

        Ok(PendingPage {
            items,
            applied_limit,
        })
    }

    /// Removes the row for `(item_id, user_id)`. Returns whether one existed.
    pub fn remove(&self, item_id: &str, user_id: &str) -> EngagementResult<bool> {
        let removed = self.repo.remove_pending(item_id, user_id)?;
        debug!("event=pending_remove module=inbox status=ok item_id={item_id} removed={removed}");
        Ok(removed)
    }

    pub fn get(&self, item_id: &str, user_id: &str) -> EngagementResult<Option<PendingAction>> {
        Ok(self.repo.get_pending(item_id, user_id)?)
    }
}

//! Share status ledger.
//!
//! # Responsibility
//! - Apply `shared -> received -> viewed` transitions on incoming shares.
//! - Serve the read-that-mutates listing used by "shared with me" views.
//!
//! # Invariants
//! - The first read of a `shared` edge transitions it to `received`; later
//!   reads no longer return it.
//! - Transitions are scoped to one recipient.

use crate::model::kind::ShareableKind;
use crate::model::share::{ShareEdge, ShareStatus};
use crate::repo::share_repo::ShareRepository;
use crate::service::error::EngagementResult;
use log::{debug, info};

/// Client acknowledgement of one delivered item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedItem {
    pub item_id: String,
    pub kind: ShareableKind,
}

/// Status ledger over share edges.
pub struct ShareStatusLedger<R: ShareRepository> {
    repo: R,
}

impl<R: ShareRepository> ShareStatusLedger<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns every `shared` edge into `user_id` and flips them to `received`.
    ///
    /// The list and the guarded transition run in one write transaction, so
    /// concurrent first reads never return the same edge twice. The returned
    /// edges carry their pre-flip status.
    pub fn mark_received_and_return(
        &self,
        user_id: &str,
        kind: ShareableKind,
        at_ms: i64,
    ) -> EngagementResult<Vec<ShareEdge>> {
        let edges = self.repo.claim_shared(user_id, kind, at_ms)?;
        if !edges.is_empty() {
            info!(
                "event=share_mark_received module=ledger status=ok kind={kind} changed={}",
                edges.len()
            );
        }
        Ok(edges)
    }

    /// Sets the status of the share(s) of `item_id` into `user_id`.
    ///
    /// Unconditional; absent edges are a no-op.
    pub fn set_status(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
        status: ShareStatus,
        at_ms: i64,
    ) -> EngagementResult<usize> {
        let changed = self
            .repo
            .set_item_status(user_id, kind, item_id, None, status, at_ms)?;
        debug!(
            "event=share_set_status module=ledger status=ok kind={kind} item_id={item_id} to={} changed={changed}",
            status.as_str()
        );
        Ok(changed)
    }

    /// Flips the listed items from `shared` to `received`.
    ///
    /// Items already received or viewed keep their status.
    pub fn received_items(
        &self,
        user_id: &str,
        items: &[ReceivedItem],
        at_ms: i64,
    ) -> EngagementResult<usize> {
        let mut changed = 0;
        for item in items {
            changed += self.repo.set_item_status(
                user_id,
                item.kind,
                &item.item_id,
                Some(ShareStatus::Shared),
                ShareStatus::Received,
                at_ms,
            )?;
        }
        Ok(changed)
    }

    /// Read-only listing of incoming shares.
    pub fn list_incoming(
        &self,
        user_id: &str,
        kind: ShareableKind,
        status: Option<ShareStatus>,
    ) -> EngagementResult<Vec<ShareEdge>> {
        Ok(self.repo.list_incoming(user_id, kind, status)?)
    }

    pub fn find_incoming(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
    ) -> EngagementResult<Option<ShareEdge>> {
        Ok(self.repo.find_incoming(user_id, kind, item_id)?)
    }
}

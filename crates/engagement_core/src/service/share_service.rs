//! Share use-cases.
//!
//! # Responsibility
//! - Record `sharer -> recipient` edges for catalog items.
//! - Open the matching pending inbox rows.
//!
//! # Invariants
//! - Only items known to their catalog can be shared.
//! - Each recipient receives at most one edge per call.

use crate::catalog::CatalogRegistry;
use crate::model::kind::ShareableKind;
use crate::model::share::{NewShare, ShareEdge};
use crate::repo::share_repo::ShareRepository;
use crate::service::error::{EngagementError, EngagementResult};
use log::info;
use std::collections::BTreeSet;

/// Share request for one item to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub sharer_id: String,
    pub recipients: Vec<String>,
    pub kind: ShareableKind,
    pub item_id: String,
    pub org_id: Option<String>,
}

pub struct ShareService<'a, R: ShareRepository> {
    repo: R,
    catalogs: &'a CatalogRegistry,
}

impl<'a, R: ShareRepository> ShareService<'a, R> {
    pub fn new(repo: R, catalogs: &'a CatalogRegistry) -> Self {
        Self { repo, catalogs }
    }

    /// Shares one item; returns the stored edges sorted by recipient id.
    ///
    /// Duplicate recipients collapse into one edge. Resharing resets an
    /// existing edge to `shared`.
    pub fn share_item(
        &self,
        request: &ShareRequest,
        at_ms: i64,
    ) -> EngagementResult<Vec<ShareEdge>> {
        let recipients: BTreeSet<&str> = request
            .recipients
            .iter()
            .map(|recipient| recipient.trim())
            .filter(|recipient| !recipient.is_empty())
            .collect();
        if recipients.is_empty() {
            return Err(EngagementError::InvalidRequest(
                "at least one recipient is required".to_string(),
            ));
        }

        if self
            .catalogs
            .get_item(request.kind, &request.item_id)?
            .is_none()
        {
            return Err(EngagementError::NotFound {
                kind: request.kind,
                item_id: request.item_id.clone(),
            });
        }

        let edges = recipients
            .into_iter()
            .map(|recipient| {
                self.repo
                    .record_share(&NewShare {
                        kind: request.kind,
                        item_id: request.item_id.clone(),
                        sharer_id: request.sharer_id.clone(),
                        recipient_id: recipient.to_string(),
                        org_id: request.org_id.clone(),
                        shared_at: at_ms,
                    })
                    .map_err(EngagementError::from)
            })
            .collect::<EngagementResult<Vec<_>>>()?;

        info!(
            "event=share_item module=share status=ok kind={} item_id={} recipients={}",
            request.kind,
            request.item_id,
            edges.len()
        );
        Ok(edges)
    }
}

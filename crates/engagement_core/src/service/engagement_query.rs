//! Engagement read paths.
//!
//! # Responsibility
//! - List joined items (current or all) with sharer identity.
//! - Provide the authoritative active count for counter cache refills.
//! - Aggregate tracking events per active join.

use crate::catalog::{CatalogRegistry, ItemDetails};
use crate::model::join::JoinEdge;
use crate::model::kind::ShareableKind;
use crate::repo::join_repo::{JoinRepository, SharerIdentity};
use crate::service::error::{EngagementError, EngagementResult};
use crate::service::lookup_details;

/// Joined item with sharer and catalog enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedItemView {
    pub join: JoinEdge,
    pub sharer: Option<SharerIdentity>,
    pub details: Option<ItemDetails>,
}

/// Progress aggregate for one active join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinProgressView {
    pub join: JoinEdge,
    pub event_count: i64,
    pub target_value: Option<i64>,
    pub duration: Option<String>,
}

/// Read-side service over join edges.
pub struct EngagementQueryService<'a, R: JoinRepository> {
    repo: R,
    catalogs: &'a CatalogRegistry,
}

impl<'a, R: JoinRepository> EngagementQueryService<'a, R> {
    pub fn new(repo: R, catalogs: &'a CatalogRegistry) -> Self {
        Self { repo, catalogs }
    }

    /// Lists joined items of one kind, optionally only active ones.
    pub fn list_joined(
        &self,
        user_id: &str,
        kind: ShareableKind,
        only_active: bool,
    ) -> EngagementResult<Vec<JoinedItemView>> {
        ensure_joinable(kind)?;
        self.repo
            .list_joined(user_id, kind, only_active)?
            .into_iter()
            .map(|record| {
                let details = lookup_details(self.catalogs, kind, &record.edge.item_id)?;
                Ok(JoinedItemView {
                    join: record.edge,
                    sharer: record.sharer,
                    details,
                })
            })
            .collect()
    }

    /// Authoritative count of active join edges.
    pub fn count_active(&self, user_id: &str, kind: ShareableKind) -> EngagementResult<i64> {
        ensure_joinable(kind)?;
        Ok(self.repo.count_active(user_id, kind)?)
    }

    /// Active joins with tracked event counts, targets and durations.
    pub fn with_count(
        &self,
        user_id: &str,
        kind: ShareableKind,
    ) -> EngagementResult<Vec<JoinProgressView>> {
        ensure_joinable(kind)?;
        self.repo
            .list_progress(user_id, kind)?
            .into_iter()
            .map(|record| {
                let details = lookup_details(self.catalogs, kind, &record.edge.item_id)?;
                Ok(JoinProgressView {
                    target_value: record.edge.target_value,
                    duration: details.map(|details| details.duration),
                    event_count: record.event_count,
                    join: record.edge,
                })
            })
            .collect()
    }

    pub fn get_join(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
    ) -> EngagementResult<Option<JoinEdge>> {
        ensure_joinable(kind)?;
        Ok(self.repo.get_join_edge(user_id, kind, item_id)?)
    }
}

fn ensure_joinable(kind: ShareableKind) -> EngagementResult<()> {
    if kind.is_joinable() {
        Ok(())
    } else {
        Err(EngagementError::NotJoinable(kind))
    }
}

//! Join coordinator: one signup flow for every joinable kind.
//!
//! # Responsibility
//! - Enforce the per-kind active limit through the counter cache.
//! - Resolve the item via the shared path first, then discovery.
//! - Upsert the join edge and drain inbox/ledger state when the item becomes
//!   active for the user.
//!
//! # Invariants
//! - Repeated signups for the same `(user, kind, item)` increment the counter
//!   at most once.
//! - Restarting a completed edge drops the cached count; the next signup
//!   recounts from storage.
//! - Capacity, resolution and duration failures leave storage untouched.
//! - The limit is soft: concurrent signups to different items may both pass
//!   the cached check and admit one item over the limit.
//! - Counter failures never fail a join; the edge is the durable fact.

use crate::cache::{CounterCache, CounterKey};
use crate::catalog::{CatalogItem, CatalogRegistry};
use crate::config::ActiveLimits;
use crate::model::duration::parse_iso_duration;
use crate::model::join::{JoinEdge, JoinEdgeUpsert};
use crate::model::kind::ShareableKind;
use crate::model::share::ShareStatus;
use crate::repo::join_repo::{JoinRepository, UpsertOutcome};
use crate::repo::pending_repo::PendingRepository;
use crate::repo::share_repo::ShareRepository;
use crate::service::engagement_query::EngagementQueryService;
use crate::service::error::{EngagementError, EngagementResult};
use crate::service::pending_inbox::PendingActionInbox;
use crate::service::share_ledger::ShareStatusLedger;
use log::{error, info, warn};
use std::time::Instant;

/// How the joined item was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinSource {
    /// An incoming share exists for the user.
    Shared { sharer_id: String },
    /// Found in the user's organisation without a share.
    Discovered,
}

/// Result of one signup call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupOutcome {
    pub join: JoinEdge,
    /// Active count observed by the capacity check.
    pub active_count_before_join: i64,
    /// `false` when an existing edge was refreshed or reactivated.
    pub inserted: bool,
    /// `true` when a completed edge was restarted.
    pub reactivated: bool,
    pub source: JoinSource,
}

/// Coordinates signups across the counter cache, storage and catalogs.
pub struct JoinCoordinator<'a, J, S, P>
where
    J: JoinRepository + Clone,
    S: ShareRepository,
    P: PendingRepository,
{
    joins: J,
    queries: EngagementQueryService<'a, J>,
    ledger: ShareStatusLedger<S>,
    inbox: PendingActionInbox<'a, P>,
    counters: &'a dyn CounterCache,
    catalogs: &'a CatalogRegistry,
    limits: ActiveLimits,
}

impl<'a, J, S, P> JoinCoordinator<'a, J, S, P>
where
    J: JoinRepository + Clone,
    S: ShareRepository,
    P: PendingRepository,
{
    pub fn new(
        joins: J,
        ledger: ShareStatusLedger<S>,
        inbox: PendingActionInbox<'a, P>,
        counters: &'a dyn CounterCache,
        catalogs: &'a CatalogRegistry,
        limits: ActiveLimits,
    ) -> Self {
        Self {
            queries: EngagementQueryService::new(joins.clone(), catalogs),
            joins,
            ledger,
            inbox,
            counters,
            catalogs,
            limits,
        }
    }

    pub fn signup_to_goal(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        goal_id: &str,
        now_ms: i64,
    ) -> EngagementResult<SignupOutcome> {
        self.signup_to(ShareableKind::Goal, user_id, org_id, goal_id, now_ms)
    }

    pub fn signup_to_challenge(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        challenge_id: &str,
        now_ms: i64,
    ) -> EngagementResult<SignupOutcome> {
        self.signup_to(ShareableKind::Challenge, user_id, org_id, challenge_id, now_ms)
    }

    pub fn signup_to_habit(
        &self,
        user_id: &str,
        org_id: Option<&str>,
        habit_id: &str,
        now_ms: i64,
    ) -> EngagementResult<SignupOutcome> {
        self.signup_to(ShareableKind::Habit, user_id, org_id, habit_id, now_ms)
    }

    /// Signs `user_id` up to `item_id` of `kind`, starting at `now_ms`.
    pub fn signup_to(
        &self,
        kind: ShareableKind,
        user_id: &str,
        org_id: Option<&str>,
        item_id: &str,
        now_ms: i64,
    ) -> EngagementResult<SignupOutcome> {
        let started_at = Instant::now();
        let limit = self
            .limits
            .limit_for(kind)
            .ok_or(EngagementError::NotJoinable(kind))?;
        if user_id.trim().is_empty() || item_id.trim().is_empty() {
            return Err(EngagementError::InvalidRequest(
                "user_id and item_id must not be blank".to_string(),
            ));
        }

        let key = CounterKey::new(user_id, kind);
        let active = self.resolve_active_count(&key)?;
        if active >= i64::from(limit) {
            warn!(
                "event=signup module=join status=rejected kind={kind} item_id={item_id} reason=capacity active={active} limit={limit}"
            );
            return Err(EngagementError::CapacityExceeded {
                kind,
                limit,
                active,
            });
        }

        let (item, source) = self.resolve_item(kind, user_id, org_id, item_id)?;
        let end_at = end_timestamp(&item, now_ms)?;

        let (join, outcome) = self.joins.upsert_join_edge(&JoinEdgeUpsert {
            user_id: user_id.to_string(),
            kind,
            item_id: item_id.to_string(),
            org_id: org_id.map(str::to_string),
            start_at: now_ms,
            end_at,
            target_value: item.target_value,
        })?;

        match outcome {
            UpsertOutcome::Inserted => {
                // Not retried: a timed-out increment may already have applied.
                if let Err(err) = self.counters.increment(&key) {
                    warn!(
                        "event=counter_increment module=join status=degraded key={key} error={err}"
                    );
                }
                self.drain_share(&key, &source, item_id, now_ms)?;
            }
            UpsertOutcome::Reactivated => {
                if let Err(err) = self.counters.invalidate(&key) {
                    warn!(
                        "event=counter_invalidate module=join status=degraded key={key} error={err}"
                    );
                }
                self.drain_share(&key, &source, item_id, now_ms)?;
            }
            UpsertOutcome::Refreshed => {}
        }

        info!(
            "event=signup module=join status=ok kind={kind} item_id={item_id} outcome={} source={} active_before={active} duration_ms={}",
            outcome.as_str(),
            source_label(&source),
            started_at.elapsed().as_millis()
        );
        Ok(SignupOutcome {
            join,
            active_count_before_join: active,
            inserted: outcome == UpsertOutcome::Inserted,
            reactivated: outcome == UpsertOutcome::Reactivated,
            source,
        })
    }

    /// Reads the cached count; on a miss or cache failure, recomputes from
    /// storage and seeds the cache.
    fn resolve_active_count(&self, key: &CounterKey) -> EngagementResult<i64> {
        match self.counters.get(key) {
            Ok(Some(count)) => return Ok(count),
            Ok(None) => {}
            Err(err) => {
                warn!("event=counter_get module=join status=degraded key={key} error={err}");
            }
        }

        let count = self.queries.count_active(&key.user_id, key.kind)?;
        if let Err(err) = self.counters.set(key, count) {
            warn!("event=counter_set module=join status=degraded key={key} error={err}");
        }
        Ok(count)
    }

    fn resolve_item(
        &self,
        kind: ShareableKind,
        user_id: &str,
        org_id: Option<&str>,
        item_id: &str,
    ) -> EngagementResult<(CatalogItem, JoinSource)> {
        let not_found = || EngagementError::NotFound {
            kind,
            item_id: item_id.to_string(),
        };
        let item = self.catalogs.get_item(kind, item_id)?.ok_or_else(not_found)?;

        if let Some(share) = self.ledger.find_incoming(user_id, kind, item_id)? {
            return Ok((
                item,
                JoinSource::Shared {
                    sharer_id: share.sharer_id,
                },
            ));
        }
        if item.visible_to_org(org_id) {
            return Ok((item, JoinSource::Discovered));
        }
        Err(not_found())
    }

    /// Clears the pending row and marks the share viewed for shared joins.
    fn drain_share(
        &self,
        key: &CounterKey,
        source: &JoinSource,
        item_id: &str,
        now_ms: i64,
    ) -> EngagementResult<()> {
        if let JoinSource::Shared { .. } = source {
            self.inbox.remove(item_id, &key.user_id)?;
            self.ledger
                .set_status(&key.user_id, key.kind, item_id, ShareStatus::Viewed, now_ms)?;
        }
        Ok(())
    }
}

fn end_timestamp(item: &CatalogItem, start_ms: i64) -> EngagementResult<i64> {
    let invalid = || {
        error!(
            "event=signup module=join status=error error_code=invalid_duration kind={} item_id={} value={:?}",
            item.kind, item.id, item.duration
        );
        EngagementError::InvalidDuration {
            kind: item.kind,
            item_id: item.id.clone(),
            value: item.duration.clone(),
        }
    };
    let duration = parse_iso_duration(&item.duration).map_err(|_| invalid())?;
    duration.end_from(start_ms).ok_or_else(invalid)
}

fn source_label(source: &JoinSource) -> &'static str {
    match source {
        JoinSource::Shared { .. } => "shared",
        JoinSource::Discovered => "discovered",
    }
}

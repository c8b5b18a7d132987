//! Use-case API consumed by the transport layer.
//!
//! # Responsibility
//! - Expose the engagement operations by name over one database connection.
//! - Wire repositories, services, the counter cache and catalogs per call.
//!
//! # Invariants
//! - Collaborators are injected; the API holds no global handles.
//! - Wall-clock time is read once per operation.

use crate::cache::CounterCache;
use crate::catalog::{CatalogRegistry, ItemDetails};
use crate::config::{ActiveLimits, EngagementConfig, InboxConfig};
use crate::model::kind::ShareableKind;
use crate::model::share::ShareEdge;
use crate::repo::join_repo::SqliteJoinRepository;
use crate::repo::pending_repo::SqlitePendingRepository;
use crate::repo::share_repo::SqliteShareRepository;
use crate::service::engagement_query::{EngagementQueryService, JoinProgressView, JoinedItemView};
use crate::service::error::EngagementResult;
use crate::service::join_coordinator::{JoinCoordinator, SignupOutcome};
use crate::service::pending_inbox::{PendingActionInbox, PendingListRequest, PendingPage};
use crate::service::share_ledger::{ReceivedItem, ShareStatusLedger};
use crate::service::share_service::{ShareRequest, ShareService};
use crate::service::{lookup_details, now_epoch_ms};
use rusqlite::Connection;

/// Incoming share with catalog display fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedItemView {
    /// Edge as it was before the read flipped it to `received`.
    pub share: ShareEdge,
    pub details: Option<ItemDetails>,
}

type SqliteCoordinator<'a> = JoinCoordinator<
    'a,
    SqliteJoinRepository<'a>,
    SqliteShareRepository<'a>,
    SqlitePendingRepository<'a>,
>;

/// Named engagement operations over one SQLite connection.
pub struct EngagementApi<'a> {
    conn: &'a Connection,
    counters: &'a dyn CounterCache,
    catalogs: &'a CatalogRegistry,
    limits: ActiveLimits,
    inbox: InboxConfig,
}

impl<'a> EngagementApi<'a> {
    pub fn new(
        conn: &'a Connection,
        counters: &'a dyn CounterCache,
        catalogs: &'a CatalogRegistry,
        config: &EngagementConfig,
    ) -> Self {
        Self {
            conn,
            counters,
            catalogs,
            limits: config.limits,
            inbox: config.inbox,
        }
    }

    pub fn signup_to_goal(
        &self,
        user_id: &str,
        goal_id: &str,
        org_id: Option<&str>,
    ) -> EngagementResult<SignupOutcome> {
        self.coordinator()?
            .signup_to_goal(user_id, org_id, goal_id, now_epoch_ms())
    }

    pub fn signup_to_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
        org_id: Option<&str>,
    ) -> EngagementResult<SignupOutcome> {
        self.coordinator()?
            .signup_to_challenge(user_id, org_id, challenge_id, now_epoch_ms())
    }

    pub fn signup_to_habit(
        &self,
        user_id: &str,
        habit_id: &str,
        org_id: Option<&str>,
    ) -> EngagementResult<SignupOutcome> {
        self.coordinator()?
            .signup_to_habit(user_id, org_id, habit_id, now_epoch_ms())
    }

    pub fn get_current_joined_goals(&self, user_id: &str) -> EngagementResult<Vec<JoinedItemView>> {
        self.joined(user_id, ShareableKind::Goal, true)
    }

    pub fn get_current_joined_challenges(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<JoinedItemView>> {
        self.joined(user_id, ShareableKind::Challenge, true)
    }

    pub fn get_current_joined_habits(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<JoinedItemView>> {
        self.joined(user_id, ShareableKind::Habit, true)
    }

    pub fn get_all_joined_goals(&self, user_id: &str) -> EngagementResult<Vec<JoinedItemView>> {
        self.joined(user_id, ShareableKind::Goal, false)
    }

    pub fn get_all_joined_challenges(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<JoinedItemView>> {
        self.joined(user_id, ShareableKind::Challenge, false)
    }

    pub fn get_all_joined_habits(&self, user_id: &str) -> EngagementResult<Vec<JoinedItemView>> {
        self.joined(user_id, ShareableKind::Habit, false)
    }

    /// Returns new goal shares for `user_id`; the first read marks them received.
    pub fn get_shared_goals_for_user(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.shared_for_user(user_id, ShareableKind::Goal)
    }

    pub fn get_shared_challenges_for_user(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.shared_for_user(user_id, ShareableKind::Challenge)
    }

    pub fn get_shared_habits_for_user(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.shared_for_user(user_id, ShareableKind::Habit)
    }

    pub fn get_shared_plans_for_user(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.shared_for_user(user_id, ShareableKind::Plan)
    }

    pub fn get_shared_surveys_for_user(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.shared_for_user(user_id, ShareableKind::Survey)
    }

    pub fn get_shared_content_for_user(
        &self,
        user_id: &str,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.shared_for_user(user_id, ShareableKind::Content)
    }

    pub fn get_pending_shared_actions(
        &self,
        request: &PendingListRequest,
    ) -> EngagementResult<PendingPage> {
        self.inbox()?.list(request)
    }

    /// Acknowledges delivered items; returns how many edges changed status.
    pub fn received_items(
        &self,
        user_id: &str,
        items: &[ReceivedItem],
    ) -> EngagementResult<usize> {
        self.ledger()?.received_items(user_id, items, now_epoch_ms())
    }

    /// Dismisses one inbox row. Absent rows are not an error.
    pub fn remove_pending_shared_action(
        &self,
        item_id: &str,
        user_id: &str,
    ) -> EngagementResult<bool> {
        self.inbox()?.remove(item_id, user_id)
    }

    pub fn share_item(&self, request: &ShareRequest) -> EngagementResult<Vec<ShareEdge>> {
        ShareService::new(SqliteShareRepository::try_new(self.conn)?, self.catalogs)
            .share_item(request, now_epoch_ms())
    }

    pub fn with_count(
        &self,
        user_id: &str,
        kind: ShareableKind,
    ) -> EngagementResult<Vec<JoinProgressView>> {
        self.queries()?.with_count(user_id, kind)
    }

    pub fn count_active(&self, user_id: &str, kind: ShareableKind) -> EngagementResult<i64> {
        self.queries()?.count_active(user_id, kind)
    }

    fn joined(
        &self,
        user_id: &str,
        kind: ShareableKind,
        only_active: bool,
    ) -> EngagementResult<Vec<JoinedItemView>> {
        self.queries()?.list_joined(user_id, kind, only_active)
    }

    fn shared_for_user(
        &self,
        user_id: &str,
        kind: ShareableKind,
    ) -> EngagementResult<Vec<SharedItemView>> {
        self.ledger()?
            .mark_received_and_return(user_id, kind, now_epoch_ms())?
            .into_iter()
            .map(|share| {
                let details = lookup_details(self.catalogs, share.kind, &share.item_id)?;
                Ok(SharedItemView { share, details })
            })
            .collect()
    }

    fn queries(&self) -> EngagementResult<EngagementQueryService<'a, SqliteJoinRepository<'a>>> {
        Ok(EngagementQueryService::new(
            SqliteJoinRepository::try_new(self.conn)?,
            self.catalogs,
        ))
    }

    fn ledger(&self) -> EngagementResult<ShareStatusLedger<SqliteShareRepository<'a>>> {
        Ok(ShareStatusLedger::new(SqliteShareRepository::try_new(
            self.conn,
        )?))
    }

    fn inbox(&self) -> EngagementResult<PendingActionInbox<'a, SqlitePendingRepository<'a>>> {
        Ok(PendingActionInbox::new(
            SqlitePendingRepository::try_new(self.conn)?,
            self.catalogs,
            self.inbox,
        ))
    }

    fn coordinator(&self) -> EngagementResult<SqliteCoordinator<'a>> {
        Ok(JoinCoordinator::new(
            SqliteJoinRepository::try_new(self.conn)?,
            self.ledger()?,
            self.inbox()?,
            self.counters,
            self.catalogs,
            self.limits,
        ))
    }
}

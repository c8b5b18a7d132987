//! Share edge repository and SQLite implementation.
//!
//! # Responsibility
//! - Persist `sharer -> recipient` edges and their pending inbox mirrors.
//! - Apply status transitions scoped to one recipient.
//!
//! # Invariants
//! - A share and its pending mirror row are written in one transaction.
//! - No pending row is opened for an item the recipient already has active.
//! - Status updates never touch edges of other recipients.
//! - Claiming `shared` edges holds the write lock from list to transition, so
//!   each edge is claimed by exactly one reader.

use crate::model::join::EdgeValidationError;
use crate::model::kind::ShareableKind;
use crate::model::share::{NewShare, ShareEdge, ShareStatus};
use crate::repo::{
    active_join_status_sql, ensure_connection_ready, parse_kind, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Row, Transaction,
    TransactionBehavior,
};
use uuid::Uuid;

const SHARE_SELECT_SQL: &str = "SELECT
    id,
    kind,
    item_id,
    sharer_id,
    recipient_id,
    org_id,
    status,
    created_at,
    updated_at
FROM share_edges";

/// Repository interface for share edges.
pub trait ShareRepository {
    /// Records one share as `shared` and opens its pending inbox row.
    ///
    /// Resharing an existing `(kind, item, sharer, recipient)` edge resets it
    /// to `shared` and reopens the pending row, unless the recipient already
    /// has an active join on the item.
    fn record_share(&self, share: &NewShare) -> RepoResult<ShareEdge>;
    /// Loads the most recently updated share of `item_id` into `recipient_id`.
    fn find_incoming(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        item_id: &str,
    ) -> RepoResult<Option<ShareEdge>>;
    /// Lists shares into `recipient_id`, optionally filtered by status.
    fn list_incoming(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        status: Option<ShareStatus>,
    ) -> RepoResult<Vec<ShareEdge>>;
    /// Lists the recipient's `shared` edges and moves them to `received` in
    /// one write transaction. Returned edges carry their pre-flip status.
    fn claim_shared(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        at_ms: i64,
    ) -> RepoResult<Vec<ShareEdge>>;
    /// Moves the given edges from `from` to `to`. Returns changed row count.
    fn transition_edges(
        &self,
        ids: &[Uuid],
        from: ShareStatus,
        to: ShareStatus,
        at_ms: i64,
    ) -> RepoResult<usize>;
    /// Sets the status of every share of `item_id` into `recipient_id`.
    ///
    /// With `from = Some(..)` only edges currently in that status change.
    fn set_item_status(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        item_id: &str,
        from: Option<ShareStatus>,
        to: ShareStatus,
        at_ms: i64,
    ) -> RepoResult<usize>;
}

/// SQLite-backed share repository.
#[derive(Clone, Copy)]
pub struct SqliteShareRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShareRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "share_edges",
                    &[
                        "id",
                        "kind",
                        "item_id",
                        "sharer_id",
                        "recipient_id",
                        "org_id",
                        "status",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "pending_actions",
                    &["item_id", "recipient_id", "kind", "sharer_id", "created_at"],
                ),
                ("join_edges", &["user_id", "kind", "item_id", "status"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl ShareRepository for SqliteShareRepository<'_> {
    fn record_share(&self, share: &NewShare) -> RepoResult<ShareEdge> {
        validate_share(share)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO share_edges (
                id,
                kind,
                item_id,
                sharer_id,
                recipient_id,
                org_id,
                status,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'shared', ?7, ?7)
            ON CONFLICT (kind, item_id, sharer_id, recipient_id) DO UPDATE SET
                status = 'shared',
                org_id = excluded.org_id,
                updated_at = excluded.updated_at;",
            params![
                Uuid::new_v4().to_string(),
                share.kind.as_str(),
                share.item_id.as_str(),
                share.sharer_id.as_str(),
                share.recipient_id.as_str(),
                share.org_id.as_deref(),
                share.shared_at,
            ],
        )?;
        tx.execute(
            &format!(
                "INSERT INTO pending_actions (
                    item_id,
                    recipient_id,
                    kind,
                    sharer_id,
                    org_id,
                    created_at
                )
                SELECT ?1, ?2, ?3, ?4, ?5, ?6
                WHERE NOT EXISTS (
                    SELECT 1
                    FROM join_edges
                    WHERE user_id = ?2
                      AND kind = ?3
                      AND item_id = ?1
                      AND status IN {}
                )
                ON CONFLICT (item_id, recipient_id) DO UPDATE SET
                    kind = excluded.kind,
                    sharer_id = excluded.sharer_id,
                    org_id = excluded.org_id,
                    created_at = excluded.created_at;",
                active_join_status_sql()
            ),
            params![
                share.item_id.as_str(),
                share.recipient_id.as_str(),
                share.kind.as_str(),
                share.sharer_id.as_str(),
                share.org_id.as_deref(),
                share.shared_at,
            ],
        )?;

        let edge = tx
            .query_row(
                &format!(
                    "{SHARE_SELECT_SQL}
                     WHERE kind = ?1
                       AND item_id = ?2
                       AND sharer_id = ?3
                       AND recipient_id = ?4;"
                ),
                params![
                    share.kind.as_str(),
                    share.item_id.as_str(),
                    share.sharer_id.as_str(),
                    share.recipient_id.as_str(),
                ],
                |row| Ok(parse_share_row(row)),
            )??;
        tx.commit()?;
        Ok(edge)
    }

    fn find_incoming(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        item_id: &str,
    ) -> RepoResult<Option<ShareEdge>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "{SHARE_SELECT_SQL}
                     WHERE recipient_id = ?1
                       AND kind = ?2
                       AND item_id = ?3
                     ORDER BY updated_at DESC, id ASC
                     LIMIT 1;"
                ),
                params![recipient_id, kind.as_str(), item_id],
                |row| Ok(parse_share_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_incoming(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        status: Option<ShareStatus>,
    ) -> RepoResult<Vec<ShareEdge>> {
        let mut sql = format!("{SHARE_SELECT_SQL} WHERE recipient_id = ? AND kind = ?");
        let mut bind_values = vec![
            Value::Text(recipient_id.to_string()),
            Value::Text(kind.as_str().to_string()),
        ];
        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_share_row(row)?);
        }
        Ok(edges)
    }

    fn claim_shared(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        at_ms: i64,
    ) -> RepoResult<Vec<ShareEdge>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let edges = self.list_incoming(recipient_id, kind, Some(ShareStatus::Shared))?;
        let ids: Vec<Uuid> = edges.iter().map(|edge| edge.id).collect();
        self.transition_edges(&ids, ShareStatus::Shared, ShareStatus::Received, at_ms)?;
        tx.commit()?;
        Ok(edges)
    }

    fn transition_edges(
        &self,
        ids: &[Uuid],
        from: ShareStatus,
        to: ShareStatus,
        at_ms: i64,
    ) -> RepoResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "UPDATE share_edges
             SET status = ?, updated_at = ?
             WHERE status = ?
               AND id IN ({placeholders});"
        );
        let mut bind_values = vec![
            Value::Text(to.as_str().to_string()),
            Value::Integer(at_ms),
            Value::Text(from.as_str().to_string()),
        ];
        bind_values.extend(ids.iter().map(|id| Value::Text(id.to_string())));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed)
    }

    fn set_item_status(
        &self,
        recipient_id: &str,
        kind: ShareableKind,
        item_id: &str,
        from: Option<ShareStatus>,
        to: ShareStatus,
        at_ms: i64,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE share_edges
             SET status = ?1, updated_at = ?2
             WHERE recipient_id = ?3
               AND kind = ?4
               AND item_id = ?5
               AND (?6 IS NULL OR status = ?6);",
            params![
                to.as_str(),
                at_ms,
                recipient_id,
                kind.as_str(),
                item_id,
                from.map(ShareStatus::as_str),
            ],
        )?;
        Ok(changed)
    }
}

fn validate_share(share: &NewShare) -> Result<(), EdgeValidationError> {
    for (field, value) in [
        ("item_id", share.item_id.as_str()),
        ("sharer_id", share.sharer_id.as_str()),
        ("recipient_id", share.recipient_id.as_str()),
    ] {
        if value.trim().is_empty() {
            return Err(EdgeValidationError::BlankField(field));
        }
    }
    if share.sharer_id == share.recipient_id {
        return Err(EdgeValidationError::SelfShare(share.sharer_id.clone()));
    }
    Ok(())
}

fn parse_share_row(row: &Row<'_>) -> RepoResult<ShareEdge> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let status_text: String = row.get("status")?;
    let status = ShareStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid share status `{status_text}` in share_edges.status"
        ))
    })?;

    Ok(ShareEdge {
        id: parse_uuid(&id_text, "share_edges.id")?,
        kind: parse_kind(&kind_text, "share_edges.kind")?,
        item_id: row.get("item_id")?,
        sharer_id: row.get("sharer_id")?,
        recipient_id: row.get("recipient_id")?,
        org_id: row.get("org_id")?,
        status,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

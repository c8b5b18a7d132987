//! Pending action inbox repository.
//!
//! # Responsibility
//! - Page through undisposed incoming shares for one recipient.
//! - Remove rows once the recipient joins or dismisses the item.
//!
//! # Invariants
//! - Rows are keyed by `(item_id, recipient_id)`.
//! - Removal of an absent row is not an error.

use crate::model::pending::{PendingAction, SortOrder};
use crate::repo::{ensure_connection_ready, parse_kind, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const PENDING_SELECT_SQL: &str = "SELECT
    item_id,
    recipient_id,
    kind,
    sharer_id,
    org_id,
    created_at
FROM pending_actions";

/// Page and window options for one recipient's inbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingQuery {
    pub recipient_id: String,
    /// Keeps rows shared within this organisation (and rows with no org).
    pub org_id: Option<String>,
    pub offset: u32,
    pub limit: u32,
    /// Inclusive lower bound on `created_at`.
    pub from_ms: Option<i64>,
    /// Inclusive upper bound on `created_at`.
    pub to_ms: Option<i64>,
    pub sort: SortOrder,
}

/// Repository interface for pending inbox rows.
pub trait PendingRepository {
    fn list_pending(&self, query: &PendingQuery) -> RepoResult<Vec<PendingAction>>;
    fn get_pending(&self, item_id: &str, recipient_id: &str) -> RepoResult<Option<PendingAction>>;
    /// Deletes one row. Returns whether a row existed.
    fn remove_pending(&self, item_id: &str, recipient_id: &str) -> RepoResult<bool>;
}

/// SQLite-backed pending inbox repository.
#[derive(Clone, Copy)]
pub struct SqlitePendingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePendingRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "pending_actions",
                &[
                    "item_id",
                    "recipient_id",
                    "kind",
                    "sharer_id",
                    "org_id",
                    "created_at",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl PendingRepository for SqlitePendingRepository<'_> {
    fn list_pending(&self, query: &PendingQuery) -> RepoResult<Vec<PendingAction>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let mut sql = format!("{PENDING_SELECT_SQL} WHERE recipient_id = ?");
        let mut bind_values = vec![Value::Text(query.recipient_id.clone())];

        if let Some(org_id) = query.org_id.as_ref() {
            sql.push_str(" AND (org_id IS NULL OR org_id = ?)");
            bind_values.push(Value::Text(org_id.clone()));
        }
        if let Some(from_ms) = query.from_ms {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(from_ms));
        }
        if let Some(to_ms) = query.to_ms {
            sql.push_str(" AND created_at <= ?");
            bind_values.push(Value::Integer(to_ms));
        }

        let direction = query.sort.as_sql();
        sql.push_str(&format!(
            " ORDER BY created_at {direction}, item_id {direction} LIMIT ? OFFSET ?"
        ));
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut actions = Vec::new();
        while let Some(row) = rows.next()? {
            actions.push(parse_pending_row(row)?);
        }
        Ok(actions)
    }

    fn get_pending(&self, item_id: &str, recipient_id: &str) -> RepoResult<Option<PendingAction>> {
        let row = self
            .conn
            .query_row(
                &format!("{PENDING_SELECT_SQL} WHERE item_id = ?1 AND recipient_id = ?2;"),
                params![item_id, recipient_id],
                |row| Ok(parse_pending_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn remove_pending(&self, item_id: &str, recipient_id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM pending_actions WHERE item_id = ?1 AND recipient_id = ?2;",
            params![item_id, recipient_id],
        )?;
        Ok(changed > 0)
    }
}

fn parse_pending_row(row: &Row<'_>) -> RepoResult<PendingAction> {
    let kind_text: String = row.get("kind")?;
    Ok(PendingAction {
        item_id: row.get("item_id")?,
        recipient_id: row.get("recipient_id")?,
        kind: parse_kind(&kind_text, "pending_actions.kind")?,
        sharer_id: row.get("sharer_id")?,
        org_id: row.get("org_id")?,
        created_at: row.get("created_at")?,
    })
}

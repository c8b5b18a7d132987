//! Join edge repository and SQLite implementation.
//!
//! # Responsibility
//! - Upsert `user -> item` join edges and report whether the call inserted,
//!   reactivated or merely refreshed the edge.
//! - Serve the authoritative active count used to heal the counter cache.
//! - Traverse join edges with sharer identity and tracking-event aggregates.
//!
//! # Invariants
//! - Uniqueness of `(user_id, kind, item_id)` lives in the table constraint;
//!   exactly one concurrent upsert observes [`UpsertOutcome::Inserted`].
//! - Active means status `started` or `in_progress`.

use crate::model::join::{JoinEdge, JoinEdgeUpsert, JoinStatus};
use crate::model::kind::ShareableKind;
use crate::repo::{
    active_join_status_sql, ensure_connection_ready, parse_kind, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const JOIN_COLUMNS: &str = "j.id AS id,
    j.user_id AS user_id,
    j.kind AS kind,
    j.item_id AS item_id,
    j.org_id AS org_id,
    j.status AS status,
    j.start_at AS start_at,
    j.end_at AS end_at,
    j.target_value AS target_value,
    j.created_at AS created_at,
    j.updated_at AS updated_at";

/// What a join upsert did to the stored edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No edge existed; a new one was created.
    Inserted,
    /// An inactive (completed) edge was restarted.
    Reactivated,
    /// An already active edge got a new window.
    Refreshed,
}

impl UpsertOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Reactivated => "reactivated",
            Self::Refreshed => "refreshed",
        }
    }
}

/// Display identity of the teammate who shared a joined item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharerIdentity {
    pub user_id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Join edge read model with sharer enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRecord {
    pub edge: JoinEdge,
    /// `None` for items joined through discovery.
    pub sharer: Option<SharerIdentity>,
}

/// Active join edge with the number of tracking events inside its window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinProgressRecord {
    pub edge: JoinEdge,
    pub event_count: i64,
}

/// Repository interface for join edges.
pub trait JoinRepository {
    /// Inserts or refreshes the edge for `(user, kind, item)`.
    ///
    /// Returns the stored edge and what the call changed.
    fn upsert_join_edge(
        &self,
        upsert: &JoinEdgeUpsert,
    ) -> RepoResult<(JoinEdge, UpsertOutcome)>;
    fn get_join_edge(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
    ) -> RepoResult<Option<JoinEdge>>;
    /// Lists joined items, newest start first.
    fn list_joined(
        &self,
        user_id: &str,
        kind: ShareableKind,
        only_active: bool,
    ) -> RepoResult<Vec<JoinedRecord>>;
    /// Counts active join edges.
    fn count_active(&self, user_id: &str, kind: ShareableKind) -> RepoResult<i64>;
    /// Counts tracking events per active edge, bounded by the edge window and
    /// the user's observed event range for the kind.
    fn list_progress(
        &self,
        user_id: &str,
        kind: ShareableKind,
    ) -> RepoResult<Vec<JoinProgressRecord>>;
}

/// SQLite-backed join repository.
#[derive(Clone, Copy)]
pub struct SqliteJoinRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteJoinRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                (
                    "join_edges",
                    &[
                        "id",
                        "user_id",
                        "kind",
                        "item_id",
                        "org_id",
                        "status",
                        "start_at",
                        "end_at",
                        "target_value",
                        "created_at",
                        "updated_at",
                    ],
                ),
                (
                    "tracking_events",
                    &["user_id", "kind", "item_id", "occurred_at"],
                ),
                ("user_profiles", &["user_id", "display_name", "avatar_url"]),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl JoinRepository for SqliteJoinRepository<'_> {
    fn upsert_join_edge(
        &self,
        upsert: &JoinEdgeUpsert,
    ) -> RepoResult<(JoinEdge, UpsertOutcome)> {
        upsert.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO join_edges (
                id,
                user_id,
                kind,
                item_id,
                org_id,
                status,
                start_at,
                end_at,
                target_value,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 'started', ?6, ?7, ?8, ?6, ?6)
            ON CONFLICT (user_id, kind, item_id) DO NOTHING;",
            params![
                Uuid::new_v4().to_string(),
                upsert.user_id.as_str(),
                upsert.kind.as_str(),
                upsert.item_id.as_str(),
                upsert.org_id.as_deref(),
                upsert.start_at,
                upsert.end_at,
                upsert.target_value,
            ],
        )? == 1;

        let outcome = if inserted {
            UpsertOutcome::Inserted
        } else {
            let prior = self
                .get_join_edge(&upsert.user_id, upsert.kind, &upsert.item_id)?
                .ok_or_else(|| missing_after_upsert(upsert))?;
            self.conn.execute(
                "UPDATE join_edges
                 SET
                    status = 'started',
                    org_id = ?4,
                    start_at = ?5,
                    end_at = ?6,
                    target_value = ?7,
                    updated_at = ?5
                 WHERE user_id = ?1
                   AND kind = ?2
                   AND item_id = ?3;",
                params![
                    upsert.user_id.as_str(),
                    upsert.kind.as_str(),
                    upsert.item_id.as_str(),
                    upsert.org_id.as_deref(),
                    upsert.start_at,
                    upsert.end_at,
                    upsert.target_value,
                ],
            )?;
            if prior.status.is_active() {
                UpsertOutcome::Refreshed
            } else {
                UpsertOutcome::Reactivated
            }
        };

        let edge = self
            .get_join_edge(&upsert.user_id, upsert.kind, &upsert.item_id)?
            .ok_or_else(|| missing_after_upsert(upsert))?;
        Ok((edge, outcome))
    }

    fn get_join_edge(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
    ) -> RepoResult<Option<JoinEdge>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {JOIN_COLUMNS}
                     FROM join_edges j
                     WHERE j.user_id = ?1
                       AND j.kind = ?2
                       AND j.item_id = ?3;"
                ),
                params![user_id, kind.as_str(), item_id],
                |row| Ok(parse_join_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_joined(
        &self,
        user_id: &str,
        kind: ShareableKind,
        only_active: bool,
    ) -> RepoResult<Vec<JoinedRecord>> {
        let active_filter = if only_active {
            format!(" AND j.status IN {}", active_join_status_sql())
        } else {
            String::new()
        };
        let sql = format!(
            "SELECT {JOIN_COLUMNS},
                s.sharer_id AS sharer_id,
                p.display_name AS sharer_name,
                p.avatar_url AS sharer_avatar
             FROM join_edges j
             LEFT JOIN share_edges s ON s.id = (
                SELECT s2.id
                FROM share_edges s2
                WHERE s2.recipient_id = j.user_id
                  AND s2.kind = j.kind
                  AND s2.item_id = j.item_id
                ORDER BY s2.updated_at DESC, s2.id ASC
                LIMIT 1
             )
             LEFT JOIN user_profiles p ON p.user_id = s.sharer_id
             WHERE j.user_id = ?1
               AND j.kind = ?2{active_filter}
             ORDER BY j.start_at DESC, j.item_id ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user_id, kind.as_str()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let sharer = row
                .get::<_, Option<String>>("sharer_id")?
                .map(|sharer_id| -> RepoResult<SharerIdentity> {
                    Ok(SharerIdentity {
                        user_id: sharer_id,
                        display_name: row.get("sharer_name")?,
                        avatar_url: row.get("sharer_avatar")?,
                    })
                })
                .transpose()?;
            records.push(JoinedRecord {
                edge: parse_join_row(row)?,
                sharer,
            });
        }
        Ok(records)
    }

    fn count_active(&self, user_id: &str, kind: ShareableKind) -> RepoResult<i64> {
        let count = self.conn.query_row(
            &format!(
                "SELECT COUNT(*)
                 FROM join_edges
                 WHERE user_id = ?1
                   AND kind = ?2
                   AND status IN {};",
                active_join_status_sql()
            ),
            params![user_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_progress(
        &self,
        user_id: &str,
        kind: ShareableKind,
    ) -> RepoResult<Vec<JoinProgressRecord>> {
        // MAX/MIN with a NULL bound (no events yet) yield NULL, so BETWEEN
        // matches nothing and the count stays zero.
        let active_statuses = active_join_status_sql();
        let sql = format!(
            "SELECT {JOIN_COLUMNS},
                (
                    SELECT COUNT(*)
                    FROM tracking_events e
                    WHERE e.user_id = j.user_id
                      AND e.kind = j.kind
                      AND e.item_id = j.item_id
                      AND e.occurred_at BETWEEN MAX(j.start_at, bounds.min_ts)
                                            AND MIN(j.end_at, bounds.max_ts)
                ) AS event_count
             FROM join_edges j
             CROSS JOIN (
                SELECT MIN(occurred_at) AS min_ts, MAX(occurred_at) AS max_ts
                FROM tracking_events
                WHERE user_id = ?1
                  AND kind = ?2
             ) bounds
             WHERE j.user_id = ?1
               AND j.kind = ?2
               AND j.status IN {active_statuses}
             ORDER BY j.start_at DESC, j.item_id ASC;"
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![user_id, kind.as_str()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(JoinProgressRecord {
                edge: parse_join_row(row)?,
                event_count: row.get("event_count")?,
            });
        }
        Ok(records)
    }
}

fn missing_after_upsert(upsert: &JoinEdgeUpsert) -> RepoError {
    RepoError::InvalidData(format!(
        "join edge for `{}`/`{}` missing after upsert",
        upsert.user_id, upsert.item_id
    ))
}

fn parse_join_row(row: &Row<'_>) -> RepoResult<JoinEdge> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("kind")?;
    let status_text: String = row.get("status")?;
    let status = JoinStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid join status `{status_text}` in join_edges.status"
        ))
    })?;

    Ok(JoinEdge {
        id: parse_uuid(&id_text, "join_edges.id")?,
        user_id: row.get("user_id")?,
        kind: parse_kind(&kind_text, "join_edges.kind")?,
        item_id: row.get("item_id")?,
        org_id: row.get("org_id")?,
        status,
        start_at: row.get("start_at")?,
        end_at: row.get("end_at")?,
        target_value: row.get("target_value")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

//! Tracking event repository.
//!
//! Events are check-ins against a joined item; they feed the progress
//! aggregate and are never updated in place.

use crate::model::join::EdgeValidationError;
use crate::model::kind::ShareableKind;
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection};
use uuid::Uuid;

pub trait EventRepository {
    /// Appends one tracking event and returns its id.
    fn record_event(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
        occurred_at: i64,
    ) -> RepoResult<Uuid>;
}

/// SQLite-backed tracking event repository.
#[derive(Clone, Copy)]
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "tracking_events",
                &["id", "user_id", "kind", "item_id", "occurred_at"],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn record_event(
        &self,
        user_id: &str,
        kind: ShareableKind,
        item_id: &str,
        occurred_at: i64,
    ) -> RepoResult<Uuid> {
        if !kind.is_joinable() {
            return Err(EdgeValidationError::KindNotJoinable(kind).into());
        }

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tracking_events (id, user_id, kind, item_id, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![id.to_string(), user_id, kind.as_str(), item_id, occurred_at],
        )?;
        Ok(id)
    }
}

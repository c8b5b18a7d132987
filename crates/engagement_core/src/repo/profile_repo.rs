//! User profile repository used for sharer display identity.

use crate::model::join::EdgeValidationError;
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Display identity of one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

pub trait ProfileRepository {
    fn upsert_profile(&self, profile: &UserProfile) -> RepoResult<()>;
    fn get_profile(&self, user_id: &str) -> RepoResult<Option<UserProfile>>;
}

/// SQLite-backed profile repository.
#[derive(Clone, Copy)]
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[("user_profiles", &["user_id", "display_name", "avatar_url"])],
        )?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn upsert_profile(&self, profile: &UserProfile) -> RepoResult<()> {
        if profile.user_id.trim().is_empty() {
            return Err(EdgeValidationError::BlankField("user_id").into());
        }
        if profile.display_name.trim().is_empty() {
            return Err(EdgeValidationError::BlankField("display_name").into());
        }

        self.conn.execute(
            "INSERT INTO user_profiles (user_id, display_name, avatar_url)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id) DO UPDATE SET
                display_name = excluded.display_name,
                avatar_url = excluded.avatar_url,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                profile.user_id.as_str(),
                profile.display_name.trim(),
                profile.avatar_url.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn get_profile(&self, user_id: &str) -> RepoResult<Option<UserProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT user_id, display_name, avatar_url
                 FROM user_profiles
                 WHERE user_id = ?1;",
                [user_id],
                |row| {
                    Ok(UserProfile {
                        user_id: row.get(0)?,
                        display_name: row.get(1)?,
                        avatar_url: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }
}

//! Pending action inbox rows.

use crate::model::kind::ShareableKind;
use serde::{Deserialize, Serialize};

/// Undisposed incoming share for one recipient.
///
/// Only the structural link is stored; display fields are resolved from the
/// item catalog at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub item_id: String,
    pub recipient_id: String,
    pub kind: ShareableKind,
    pub sharer_id: String,
    pub org_id: Option<String>,
    pub created_at: i64,
}

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

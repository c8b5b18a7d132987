//! Join edge model.
//!
//! # Responsibility
//! - Record that a user signed up to a goal, challenge or habit.
//! - Carry the validity window computed from the item duration.
//!
//! # Invariants
//! - `(user_id, kind, item_id)` is unique across all join edges.
//! - `end_at >= start_at`.
//! - `kind` is always joinable.

use crate::model::kind::ShareableKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Lifecycle status of a join edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStatus {
    Started,
    InProgress,
    Completed,
}

impl JoinStatus {
    /// Statuses that count towards the active-item limit.
    pub const ACTIVE: [JoinStatus; 2] = [Self::Started, Self::InProgress];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "started" => Some(Self::Started),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

/// Directed `user -> item` edge created by a signup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinEdge {
    pub id: Uuid,
    pub user_id: String,
    pub kind: ShareableKind,
    pub item_id: String,
    pub org_id: Option<String>,
    pub status: JoinStatus,
    pub start_at: i64,
    pub end_at: i64,
    pub target_value: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Write model for the join upsert. The stored status is always `started`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEdgeUpsert {
    pub user_id: String,
    pub kind: ShareableKind,
    pub item_id: String,
    pub org_id: Option<String>,
    pub start_at: i64,
    pub end_at: i64,
    pub target_value: Option<i64>,
}

impl JoinEdgeUpsert {
    /// Validates structural invariants before persistence.
    pub fn validate(&self) -> Result<(), EdgeValidationError> {
        if self.user_id.trim().is_empty() {
            return Err(EdgeValidationError::BlankField("user_id"));
        }
        if self.item_id.trim().is_empty() {
            return Err(EdgeValidationError::BlankField("item_id"));
        }
        if !self.kind.is_joinable() {
            return Err(EdgeValidationError::KindNotJoinable(self.kind));
        }
        if self.end_at < self.start_at {
            return Err(EdgeValidationError::EndBeforeStart {
                start_at: self.start_at,
                end_at: self.end_at,
            });
        }
        Ok(())
    }
}

/// Structural validation failures for edge write models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeValidationError {
    BlankField(&'static str),
    KindNotJoinable(ShareableKind),
    EndBeforeStart { start_at: i64, end_at: i64 },
    SelfShare(String),
}

impl Display for EdgeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::KindNotJoinable(kind) => write!(f, "`{kind}` items cannot be joined"),
            Self::EndBeforeStart { start_at, end_at } => {
                write!(f, "end_at ({end_at}) is earlier than start_at ({start_at})")
            }
            Self::SelfShare(user_id) => write!(f, "user `{user_id}` cannot share to self"),
        }
    }
}

impl Error for EdgeValidationError {}

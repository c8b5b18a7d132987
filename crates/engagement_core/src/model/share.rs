//! Share edge model.
//!
//! # Responsibility
//! - Record that an item was pushed from a sharer to a recipient.
//! - Track the recipient-side visibility status of that push.
//!
//! # Invariants
//! - Status moves `shared -> received` on first read and `-> viewed` on join.
//! - Share edges are never deleted by this crate.

use crate::model::kind::ShareableKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visibility status of one share edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareStatus {
    /// Pushed by the sharer, not yet seen by the recipient.
    Shared,
    /// Delivered to a recipient read path.
    Received,
    /// Recipient acted on the item (joined it).
    Viewed,
}

impl ShareStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Shared => "shared",
            Self::Received => "received",
            Self::Viewed => "viewed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "shared" => Some(Self::Shared),
            "received" => Some(Self::Received),
            "viewed" => Some(Self::Viewed),
            _ => None,
        }
    }
}

/// Directed `sharer -> recipient` edge for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEdge {
    pub id: Uuid,
    pub kind: ShareableKind,
    pub item_id: String,
    pub sharer_id: String,
    pub recipient_id: String,
    /// Organisation of the sharer at share time.
    pub org_id: Option<String>,
    pub status: ShareStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Write model for recording one share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShare {
    pub kind: ShareableKind,
    pub item_id: String,
    pub sharer_id: String,
    pub recipient_id: String,
    pub org_id: Option<String>,
    pub shared_at: i64,
}

//! Shareable item kinds.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Item kinds that can be pushed from one teammate to another.
///
/// Only goals, challenges and habits can be joined. Plans, surveys and
/// content are shareable but are dispositioned without a join edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareableKind {
    Goal,
    Challenge,
    Habit,
    Plan,
    Survey,
    Content,
}

impl ShareableKind {
    /// Every kind, in storage order.
    pub const ALL: [ShareableKind; 6] = [
        Self::Goal,
        Self::Challenge,
        Self::Habit,
        Self::Plan,
        Self::Survey,
        Self::Content,
    ];

    /// Kinds that accept a signup.
    pub const JOINABLE: [ShareableKind; 3] = [Self::Goal, Self::Challenge, Self::Habit];

    /// Stable string id used in storage and cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Challenge => "challenge",
            Self::Habit => "habit",
            Self::Plan => "plan",
            Self::Survey => "survey",
            Self::Content => "content",
        }
    }

    /// Parses a stable string id. Matching is case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "goal" => Some(Self::Goal),
            "challenge" => Some(Self::Challenge),
            "habit" => Some(Self::Habit),
            "plan" => Some(Self::Plan),
            "survey" => Some(Self::Survey),
            "content" => Some(Self::Content),
            _ => None,
        }
    }

    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Goal | Self::Challenge | Self::Habit)
    }
}

impl Display for ShareableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Engagement domain model.
//!
//! # Responsibility
//! - Define shareable item kinds and the edges recorded against them.
//! - Keep status vocabularies and their storage strings in one place.
//!
//! # Invariants
//! - At most one `JoinEdge` exists per `(user, kind, item)`.
//! - A `PendingAction` is keyed by `(item, recipient)`.
//! - All timestamps are Unix epoch milliseconds.

pub mod duration;
pub mod join;
pub mod kind;
pub mod pending;
pub mod share;

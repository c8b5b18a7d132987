//! Shared-item engagement core.
//! Sharing, signup, inbox and progress rules live here; transports only call
//! into [`EngagementApi`].

pub mod api;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use api::{EngagementApi, SharedItemView};
pub use cache::{CacheError, CounterCache, CounterKey, InMemoryCounterCache};
pub use catalog::{
    CatalogError, CatalogItem, CatalogRegistry, ItemCatalog, ItemDetails, StaticCatalog,
};
pub use config::{ActiveLimits, ConfigError, EngagementConfig, InboxConfig, LoggingConfig};
pub use logging::{init_logging, logging_status, LogLevel, LogSettings, LoggingError};
pub use model::duration::{parse_iso_duration, DurationParseError, IsoDuration};
pub use model::join::{JoinEdge, JoinStatus};
pub use model::kind::ShareableKind;
pub use model::pending::{PendingAction, SortOrder};
pub use model::share::{ShareEdge, ShareStatus};
pub use repo::{RepoError, RepoResult};
pub use service::error::{EngagementError, EngagementResult};
pub use service::join_coordinator::{JoinCoordinator, JoinSource, SignupOutcome};
pub use service::pending_inbox::{PendingActionView, PendingListRequest, PendingPage};
pub use service::share_ledger::ReceivedItem;
pub use service::share_service::ShareRequest;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

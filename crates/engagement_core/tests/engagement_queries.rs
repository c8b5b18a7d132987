mod common;

use common::{coordinator, item, memory_cache, open, share, Catalogs, HOUR_MS, T0};
use engagement_core::repo::event_repo::{EventRepository, SqliteEventRepository};
use engagement_core::repo::join_repo::SqliteJoinRepository;
use engagement_core::repo::profile_repo::{ProfileRepository, SqliteProfileRepository, UserProfile};
use engagement_core::service::engagement_query::EngagementQueryService;
use engagement_core::{
    ActiveLimits, EngagementError, JoinStatus, ShareStatus, ShareableKind, SortOrder,
};

const DAY_MS: i64 = 24 * HOUR_MS;

#[test]
fn list_joined_filters_active_and_carries_sharer_identity() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Goal, "g1", None, "P7D"));
    catalogs.add(item(ShareableKind::Goal, "g2", None, "P7D"));
    SqliteProfileRepository::try_new(&conn)
        .unwrap()
        .upsert_profile(&UserProfile {
            user_id: "coach".to_string(),
            display_name: "Coach Kim".to_string(),
            avatar_url: Some("https://img.example/coach.png".to_string()),
        })
        .unwrap();
    share(&conn, &catalogs.registry, ShareableKind::Goal, "g1", "coach", "u1", T0);

    let cache = memory_cache();
    let signups = coordinator(&conn, &cache, &catalogs.registry, ActiveLimits::default());
    signups.signup_to_goal("u1", None, "g1", T0).unwrap();
    signups
        .signup_to_goal("u1", None, "g2", T0 + HOUR_MS)
        .unwrap();
    conn.execute(
        "UPDATE join_edges SET status = 'completed' WHERE item_id = 'g2';",
        [],
    )
    .unwrap();

    let queries = EngagementQueryService::new(
        SqliteJoinRepository::try_new(&conn).unwrap(),
        &catalogs.registry,
    );

    let current = queries.list_joined("u1", ShareableKind::Goal, true).unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].join.item_id, "g1");
    let sharer = current[0].sharer.as_ref().unwrap();
    assert_eq!(sharer.user_id, "coach");
    assert_eq!(sharer.display_name.as_deref(), Some("Coach Kim"));
    assert_eq!(current[0].details.as_ref().unwrap().title, "goal g1");

    let all = queries.list_joined("u1", ShareableKind::Goal, false).unwrap();
    let ids: Vec<&str> = all.iter().map(|view| view.join.item_id.as_str()).collect();
    assert_eq!(ids, vec!["g2", "g1"]);
    assert_eq!(all[0].join.status, JoinStatus::Completed);
    assert!(all[0].sharer.is_none());

    assert_eq!(queries.count_active("u1", ShareableKind::Goal).unwrap(), 1);
}

#[test]
fn with_count_bounds_events_by_join_window() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Habit, "h1", None, "P7D"));
    catalogs.add(item(ShareableKind::Habit, "h2", None, "P14D"));
    let cache = memory_cache();
    let signups = coordinator(&conn, &cache, &catalogs.registry, ActiveLimits::default());
    signups.signup_to_habit("u1", None, "h1", T0).unwrap();
    signups.signup_to_habit("u1", None, "h2", T0).unwrap();

    let events = SqliteEventRepository::try_new(&conn).unwrap();
    for at in [T0 - HOUR_MS, T0 + HOUR_MS, T0 + 2 * HOUR_MS, T0 + 8 * DAY_MS] {
        events
            .record_event("u1", ShareableKind::Habit, "h1", at)
            .unwrap();
    }
    events
        .record_event("u2", ShareableKind::Habit, "h1", T0 + HOUR_MS)
        .unwrap();

    let queries = EngagementQueryService::new(
        SqliteJoinRepository::try_new(&conn).unwrap(),
        &catalogs.registry,
    );
    let progress = queries.with_count("u1", ShareableKind::Habit).unwrap();
    assert_eq!(progress.len(), 2);

    let h1 = progress
        .iter()
        .find(|view| view.join.item_id == "h1")
        .unwrap();
    assert_eq!(h1.event_count, 2);
    assert_eq!(h1.target_value, Some(10));
    assert_eq!(h1.duration.as_deref(), Some("P7D"));

    let h2 = progress
        .iter()
        .find(|view| view.join.item_id == "h2")
        .unwrap();
    assert_eq!(h2.event_count, 0);
}

#[test]
fn with_count_is_empty_without_tracking_events() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Challenge, "c1", None, "P7D"));
    let cache = memory_cache();
    coordinator(&conn, &cache, &catalogs.registry, ActiveLimits::default())
        .signup_to_challenge("u1", None, "c1", T0)
        .unwrap();

    let queries = EngagementQueryService::new(
        SqliteJoinRepository::try_new(&conn).unwrap(),
        &catalogs.registry,
    );
    let progress = queries.with_count("u1", ShareableKind::Challenge).unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].event_count, 0);
}

#[test]
fn get_join_returns_stored_edge() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Goal, "g1", None, "P1D"));
    let cache = memory_cache();
    coordinator(&conn, &cache, &catalogs.registry, ActiveLimits::default())
        .signup_to_goal("u1", Some("org-1"), "g1", T0)
        .unwrap();

    let queries = EngagementQueryService::new(
        SqliteJoinRepository::try_new(&conn).unwrap(),
        &catalogs.registry,
    );
    let join = queries
        .get_join("u1", ShareableKind::Goal, "g1")
        .unwrap()
        .unwrap();
    assert_eq!(join.org_id.as_deref(), Some("org-1"));
    assert_eq!(join.end_at, T0 + 24 * HOUR_MS);
    assert!(queries
        .get_join("u2", ShareableKind::Goal, "g1")
        .unwrap()
        .is_none());
}

#[test]
fn read_paths_reject_content_kinds() {
    let conn = open();
    let catalogs = Catalogs::new();
    let queries = EngagementQueryService::new(
        SqliteJoinRepository::try_new(&conn).unwrap(),
        &catalogs.registry,
    );

    let err = queries
        .count_active("u1", ShareableKind::Content)
        .unwrap_err();
    assert!(matches!(err, EngagementError::NotJoinable(ShareableKind::Content)));
    assert!(queries
        .list_joined("u1", ShareableKind::Survey, false)
        .is_err());
}

#[test]
fn enums_serialize_with_storage_names() {
    assert_eq!(
        serde_json::to_string(&ShareableKind::Challenge).unwrap(),
        "\"challenge\""
    );
    assert_eq!(
        serde_json::to_string(&JoinStatus::InProgress).unwrap(),
        "\"in_progress\""
    );
    assert_eq!(
        serde_json::to_string(&ShareStatus::Received).unwrap(),
        "\"received\""
    );
    assert_eq!(serde_json::to_string(&SortOrder::Asc).unwrap(), "\"asc\"");
    let kind: ShareableKind = serde_json::from_str("\"survey\"").unwrap();
    assert_eq!(kind, ShareableKind::Survey);
}

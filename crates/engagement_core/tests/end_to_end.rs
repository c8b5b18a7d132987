mod common;

use common::{item, memory_cache, open, Catalogs};
use engagement_core::service::pending_inbox::PendingListRequest;
use engagement_core::{
    EngagementApi, EngagementConfig, ReceivedItem, ShareRequest, ShareStatus, ShareableKind,
};

#[test]
fn share_read_join_and_rejoin_goal() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Goal, "G", Some("org-1"), "P30D"));
    let cache = memory_cache();
    let api = EngagementApi::new(&conn, &cache, &catalogs.registry, &EngagementConfig::default());

    let shared = api
        .share_item(&ShareRequest {
            sharer_id: "S".to_string(),
            recipients: vec!["U".to_string()],
            kind: ShareableKind::Goal,
            item_id: "G".to_string(),
            org_id: Some("org-1".to_string()),
        })
        .unwrap();
    assert_eq!(shared[0].status, ShareStatus::Shared);

    let incoming = api.get_shared_goals_for_user("U").unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].share.item_id, "G");
    assert_eq!(incoming[0].details.as_ref().unwrap().duration, "P30D");
    assert!(api.get_shared_goals_for_user("U").unwrap().is_empty());

    let pending = api
        .get_pending_shared_actions(&PendingListRequest {
            user_id: "U".to_string(),
            org_id: Some("org-1".to_string()),
            ..PendingListRequest::default()
        })
        .unwrap();
    assert_eq!(pending.items.len(), 1);

    let first = api.signup_to_goal("U", "G", Some("org-1")).unwrap();
    assert!(first.inserted);
    assert_eq!(first.active_count_before_join, 0);
    assert_eq!(api.count_active("U", ShareableKind::Goal).unwrap(), 1);

    let current = api.get_current_joined_goals("U").unwrap();
    let ids: Vec<&str> = current.iter().map(|view| view.join.item_id.as_str()).collect();
    assert_eq!(ids, vec!["G"]);
    assert_eq!(current[0].sharer.as_ref().unwrap().user_id, "S");

    let pending = api
        .get_pending_shared_actions(&PendingListRequest {
            user_id: "U".to_string(),
            ..PendingListRequest::default()
        })
        .unwrap();
    assert!(pending.items.is_empty());

    let again = api.signup_to_goal("U", "G", Some("org-1")).unwrap();
    assert!(!again.inserted);
    assert_eq!(again.active_count_before_join, 1);
    assert_eq!(api.count_active("U", ShareableKind::Goal).unwrap(), 1);
    assert_eq!(api.get_all_joined_goals("U").unwrap().len(), 1);
}

#[test]
fn content_shares_flow_through_inbox_and_acknowledgement() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Content, "article-1", None, "PT10M"));
    catalogs.add(item(ShareableKind::Plan, "plan-1", None, "P4W"));
    let cache = memory_cache();
    let api = EngagementApi::new(&conn, &cache, &catalogs.registry, &EngagementConfig::default());

    for (kind, item_id) in [
        (ShareableKind::Content, "article-1"),
        (ShareableKind::Plan, "plan-1"),
    ] {
        api.share_item(&ShareRequest {
            sharer_id: "S".to_string(),
            recipients: vec!["U".to_string()],
            kind,
            item_id: item_id.to_string(),
            org_id: None,
        })
        .unwrap();
    }

    let changed = api
        .received_items(
            "U",
            &[ReceivedItem {
                item_id: "article-1".to_string(),
                kind: ShareableKind::Content,
            }],
        )
        .unwrap();
    assert_eq!(changed, 1);
    assert!(api.get_shared_content_for_user("U").unwrap().is_empty());
    assert_eq!(api.get_shared_plans_for_user("U").unwrap().len(), 1);

    assert!(api.remove_pending_shared_action("article-1", "U").unwrap());
    assert!(!api.remove_pending_shared_action("article-1", "U").unwrap());
    let pending = api
        .get_pending_shared_actions(&PendingListRequest {
            user_id: "U".to_string(),
            ..PendingListRequest::default()
        })
        .unwrap();
    let ids: Vec<&str> = pending
        .items
        .iter()
        .map(|view| view.action.item_id.as_str())
        .collect();
    assert_eq!(ids, vec!["plan-1"]);
}

#[test]
fn configured_limits_apply_per_kind() {
    let conn = open();
    let catalogs = Catalogs::new();
    catalogs.add(item(ShareableKind::Challenge, "c1", None, "P7D"));
    catalogs.add(item(ShareableKind::Challenge, "c2", None, "P7D"));
    let cache = memory_cache();
    let config = EngagementConfig::from_toml_str("[limits]\nchallenge = 1\n").unwrap();
    let api = EngagementApi::new(&conn, &cache, &catalogs.registry, &config);

    api.signup_to_challenge("U", "c1", None).unwrap();
    assert!(api.signup_to_challenge("U", "c2", None).is_err());
    assert_eq!(api.get_current_joined_challenges("U").unwrap().len(), 1);
    assert!(api.get_current_joined_habits("U").unwrap().is_empty());
    assert!(api
        .with_count("U", ShareableKind::Challenge)
        .unwrap()
        .iter()
        .all(|view| view.event_count == 0));
}

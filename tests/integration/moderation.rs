use crate::common::{ingress, test_relay};
use crosschat::error::Outcome;
use crosschat::gateway::ReactionKind;

#[tokio::test]
async fn banned_user_is_blocked_before_allocation_and_dmed() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();
    t.bans.ban_user("user-u", "prior violation", "mod-1", None).unwrap();

    let outcome = t
        .orchestrator
        .handle(ingress("src-banned", "user-u", "server-a", "alpha", "hello"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::Banned);
    assert!(t.allocator.lookup_by_source_id("src-banned").unwrap().is_none());
    assert!(t.delivery_index.for_cc_id("nonexistent").unwrap().is_empty());
    assert!(t.gateway.sent().is_empty());
    assert!(t.gateway.reactions_for("src-banned").contains(&ReactionKind::Banned));
    assert_eq!(t.gateway.dms().len(), 1);
}

#[tokio::test]
async fn server_ban_blocks_before_allocation() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.bans.ban_server("server-a", "bad actor server", "mod-1").unwrap();

    let outcome = t
        .orchestrator
        .handle(ingress("src-sban", "user-u", "server-a", "alpha", "hello"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::ServerBanned);
    assert!(t.allocator.lookup_by_source_id("src-sban").unwrap().is_none());
}

#[tokio::test]
async fn excessive_caps_deletes_source_and_increments_violation_tally() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    let outcome = t
        .orchestrator
        .handle(ingress("src-caps", "user-u", "server-a", "alpha", "AAAAAAAAAA"))
        .await
        .unwrap();

    let Outcome::Blocked { reason } = outcome else { panic!("expected Blocked, got {outcome:?}") };
    assert_eq!(reason, "Caps");
    assert!(t.allocator.lookup_by_source_id("src-caps").unwrap().is_none());
    assert!(t.gateway.sent().is_empty());
    assert!(t.gateway.reactions_for("src-caps").contains(&ReactionKind::Blocked));
    assert_eq!(t.violations.count("user-u"), 1);
}

use crate::common::{ingress, test_relay};
use crosschat::error::Outcome;
use crosschat::gateway::ReactionKind;

#[tokio::test]
async fn editing_the_source_updates_every_delivered_copy() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    t.orchestrator
        .handle(ingress("src-edit", "user-u", "server-a", "alpha", "hello"))
        .await
        .unwrap();

    let before = t.delivery_index.for_cc_id(
        &t.allocator.lookup_by_source_id("src-edit").unwrap().unwrap().cc_id,
    ).unwrap();

    let edited_msg = ingress("src-edit", "user-u", "server-a", "alpha", "hello world");
    t.propagator.propagate_edit(&edited_msg, "alpha").await.unwrap();

    let record = t.allocator.lookup_by_source_id("src-edit").unwrap().unwrap();
    assert_eq!(record.content, "hello world");

    let after = t.delivery_index.for_cc_id(&record.cc_id).unwrap();
    assert_eq!(before.len(), after.len());
    assert_eq!(
        before.iter().map(|d| &d.target_channel_id).collect::<Vec<_>>(),
        after.iter().map(|d| &d.target_channel_id).collect::<Vec<_>>(),
    );

    let edited_calls = t.gateway.edited();
    assert_eq!(edited_calls.len(), 1);
    assert_eq!(edited_calls[0].2, "hello world");

    assert!(t.gateway.reactions_for("src-edit").contains(&ReactionKind::Edited));
}

#[tokio::test]
async fn operator_global_delete_removes_every_copy_and_flags_the_record() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    let outcome = t
        .orchestrator
        .handle(ingress("src-del", "user-u", "server-a", "alpha", "bye"))
        .await
        .unwrap();
    let Outcome::Processed { cc_id, .. } = outcome else { panic!("expected Processed") };

    let affected = t.propagator.global_delete(&cc_id, "operator-1").await.unwrap();
    assert_eq!(affected, 1);
    assert_eq!(t.gateway.deleted().len(), 1);

    let record = t.allocator.lookup_by_cc_id(&cc_id).unwrap().unwrap();
    assert!(record.is_deleted);
}

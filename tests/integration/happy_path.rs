use crate::common::{ingress, test_relay};
use crosschat::error::Outcome;
use crosschat::gateway::ReactionKind;

#[tokio::test]
async fn standard_user_message_relays_to_the_other_channel() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    let msg = ingress("src-1", "user-u", "server-a", "alpha", "hello");
    let outcome = t.orchestrator.handle(msg).await.unwrap();

    let Outcome::Processed { cc_id, delivered } = outcome else {
        panic!("expected Processed, got {outcome:?}");
    };
    assert_eq!(delivered, 1);
    assert_eq!(cc_id.len(), 8);

    let sent = t.gateway.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel_id, "beta");
    assert_eq!(sent[0].footer, format!("CC-{cc_id} • ID: user-u"));

    assert!(t.gateway.reactions_for("src-1").contains(&ReactionKind::Success));
}

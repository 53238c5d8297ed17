use crate::common::{ingress, test_relay};
use crosschat::automod::{AutomodConfig, AutomodPipeline};

#[test]
fn slowmode_boundaries_5_and_10_succeed_4_and_11_fail() {
    let t = test_relay();
    assert!(t.channels.enable("server-1", "S1", "c1", "chan", 5).is_ok());
    assert!(t.channels.enable("server-2", "S2", "c2", "chan", 10).is_ok());
    assert!(t.channels.enable("server-3", "S3", "c3", "chan", 4).is_err());
    assert!(t.channels.enable("server-4", "S4", "c4", "chan", 11).is_err());
}

#[test]
fn caps_boundary_nine_chars_passes_ten_chars_flags() {
    let t = test_relay();
    let config = AutomodConfig {
        spam_threshold: 100,
        duplicate_threshold: 100,
        caps_threshold_pct: 70.0,
        link_filter: false,
        invite_filter: false,
        cache_ttl_secs: 900,
    };
    let pipeline = AutomodPipeline::new(t.db.clone(), config);

    let nine = "A".repeat(9);
    let ten = "A".repeat(10);

    assert!(matches!(
        pipeline.evaluate("user-caps-a", &nine, &[]),
        crosschat::automod::Verdict::Allow
    ));
    assert!(matches!(
        pipeline.evaluate("user-caps-b", &ten, &[]),
        crosschat::automod::Verdict::Delete(_)
    ));
}

#[tokio::test]
async fn rate_boundary_three_pass_fourth_in_window_flags() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    for i in 0..3 {
        let outcome = t
            .orchestrator
            .handle(ingress(&format!("src-rate-{i}"), "user-rate", "server-a", "alpha", &format!("msg {i}")))
            .await
            .unwrap();
        assert!(matches!(outcome, crosschat::error::Outcome::Processed { .. }));
    }

    let fourth = t
        .orchestrator
        .handle(ingress("src-rate-3", "user-rate", "server-a", "alpha", "msg 3"))
        .await
        .unwrap();
    assert!(matches!(fourth, crosschat::error::Outcome::Blocked { .. }));
}

#[tokio::test]
async fn cc_id_is_eight_chars_nine_with_vip_prefix() {
    let t = test_relay_with_architect();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    let standard = t
        .orchestrator
        .handle(ingress("src-cc-std", "user-std", "server-a", "alpha", "hi"))
        .await
        .unwrap();
    let crosschat::error::Outcome::Processed { cc_id: standard_id, .. } = standard else {
        panic!("expected Processed")
    };
    assert_eq!(standard_id.len(), 8);

    let vip = t
        .orchestrator
        .handle(vip_ingress("src-cc-vip", "user-vip", "server-a", "alpha", "hi"))
        .await
        .unwrap();
    let crosschat::error::Outcome::Processed { cc_id: vip_id, .. } = vip else { panic!("expected Processed") };
    assert_eq!(vip_id.len(), 9);
    assert!(vip_id.starts_with('V'));
}

fn test_relay_with_architect() -> crate::common::TestRelay {
    crate::common::test_relay_with(|config| {
        config.architect_role_id = Some("architect-role".to_string());
    })
}

fn vip_ingress(
    source_message_id: &str,
    user_id: &str,
    server_id: &str,
    channel_id: &str,
    content: &str,
) -> crosschat::models::IngressMessage {
    let mut msg = ingress(source_message_id, user_id, server_id, channel_id, content);
    msg.author_role_ids = vec!["architect-role".to_string()];
    msg
}

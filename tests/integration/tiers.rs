use crate::common::{ingress, role_ids, test_relay, test_relay_with};
use crosschat::automod::{AutomodConfig, AutomodPipeline, Verdict};
use crosschat::error::Outcome;

fn owner_relay() -> crate::common::TestRelay {
    test_relay_with(|config| {
        config.owner_user_id = "owner-1".to_string();
    })
}

fn staffed_relay() -> crate::common::TestRelay {
    test_relay_with(|config| {
        config.staff_role_id = Some("staff-role".to_string());
        config.elite_role_id = Some("elite-role".to_string());
        config.architect_role_id = Some("architect-role".to_string());
        config.delay_elite_ms = 0;
        config.delay_architect_ms = 0;
    })
}

#[tokio::test]
async fn owner_id_resolves_founder_tier_with_zero_delay_parallel_fanout() {
    let t = owner_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();
    t.channels.enable("server-c", "Server C", "gamma", "gamma-chan", 5).unwrap();

    let outcome = t
        .orchestrator
        .handle(ingress("src-founder", "owner-1", "server-a", "alpha", "hello from the top"))
        .await
        .unwrap();

    let Outcome::Processed { delivered, .. } = outcome else { panic!("expected Processed") };
    // Founder fans out to both remaining channels, delay_founder_ms defaults to 0.
    assert_eq!(delivered, 2);
}

#[tokio::test]
async fn elite_role_resolves_elite_tier_and_vip_cc_id() {
    let t = staffed_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();

    let mut msg = ingress("src-elite", "user-elite", "server-a", "alpha", "hi");
    msg.author_role_ids = role_ids(&["elite-role"]);
    let outcome = t.orchestrator.handle(msg).await.unwrap();

    let Outcome::Processed { cc_id, delivered } = outcome else { panic!("expected Processed") };
    assert_eq!(delivered, 1);
    assert_eq!(cc_id.len(), 9);
    assert!(cc_id.starts_with('V'));
}

#[tokio::test]
async fn partner_server_resolves_partner_tier_priority_75() {
    let t = test_relay();
    t.channels.enable("server-a", "Server A", "alpha", "alpha-chan", 5).unwrap();
    t.channels.enable("server-b", "Server B", "beta", "beta-chan", 5).unwrap();
    t.tiers.mark_partner("server-a");

    let info = t.tiers.resolve("user-u", &[], "server-a");
    assert_eq!(info.tier, crosschat::models::Tier::Partner);
    assert_eq!(info.priority, 75);

    t.tiers.unmark_partner("server-a");
    let info = t.tiers.resolve("user-u", &[], "server-a");
    assert_eq!(info.tier, crosschat::models::Tier::Standard);
}

#[tokio::test]
async fn staff_role_stacks_with_elite_for_priority_ten() {
    let t = staffed_relay();
    let info = t.tiers.resolve("user-u", &role_ids(&["staff-role", "elite-role"]), "server-a");
    assert_eq!(info.tier, crosschat::models::Tier::Staff);
    assert_eq!(info.priority, 10);

    // Staff alone, no VIP role stacked, falls back to its own (sequential) priority.
    let info = t.tiers.resolve("user-u", &role_ids(&["staff-role"]), "server-a");
    assert_eq!(info.tier, crosschat::models::Tier::Staff);
    assert_eq!(info.priority, 100);
}

#[tokio::test]
async fn owner_id_takes_precedence_over_every_role() {
    let t = test_relay_with(|config| {
        config.owner_user_id = "owner-1".to_string();
        config.staff_role_id = Some("staff-role".to_string());
    });
    let info = t.tiers.resolve("owner-1", &role_ids(&["staff-role"]), "server-a");
    assert_eq!(info.tier, crosschat::models::Tier::Founder);
}

fn automod_with(configure: impl FnOnce(&mut AutomodConfig)) -> (crate::common::TestRelay, std::sync::Arc<AutomodPipeline>) {
    let t = test_relay();
    let mut config = AutomodConfig {
        spam_threshold: 100,
        duplicate_threshold: 100,
        caps_threshold_pct: 70.0,
        link_filter: true,
        invite_filter: true,
        cache_ttl_secs: 900,
    };
    configure(&mut config);
    let pipeline = AutomodPipeline::new(t.db.clone(), config);
    (t, pipeline)
}

#[tokio::test]
async fn whitelisted_user_bypasses_an_otherwise_flagged_message() {
    let (_t, pipeline) = automod_with(|_| {});
    assert!(matches!(
        pipeline.evaluate("user-w", "visit http://example.com now", &[]),
        Verdict::Delete(_)
    ));

    pipeline.whitelist_user("user-w").unwrap();
    assert!(matches!(pipeline.evaluate("user-w", "visit http://example.com now", &[]), Verdict::Allow));
}

#[tokio::test]
async fn whitelisted_role_bypasses_an_otherwise_flagged_message() {
    let (_t, pipeline) = automod_with(|_| {});
    let roles = role_ids(&["trusted-role"]);
    assert!(matches!(pipeline.evaluate("user-r", "join discord.gg/abc123", &roles), Verdict::Delete(_)));

    pipeline.whitelist_role("trusted-role").unwrap();
    assert!(matches!(pipeline.evaluate("user-r", "join discord.gg/abc123", &roles), Verdict::Allow));
}

#[tokio::test]
async fn duplicate_message_is_flagged_after_the_threshold() {
    let (_t, pipeline) = automod_with(|c| c.duplicate_threshold = 2);
    assert!(matches!(pipeline.evaluate("user-d", "same thing", &[]), Verdict::Allow));
    assert!(matches!(pipeline.evaluate("user-d", "same thing", &[]), Verdict::Delete(crosschat::automod::Reason::Duplicate)));
}

#[tokio::test]
async fn unauthorized_link_is_flagged_when_the_link_filter_is_on() {
    let (_t, pipeline) = automod_with(|_| {});
    assert!(matches!(
        pipeline.evaluate("user-l", "check this out http://example.com/path", &[]),
        Verdict::Delete(crosschat::automod::Reason::UnauthorizedLink)
    ));
    assert!(matches!(pipeline.evaluate("user-l2", "no links in this message", &[]), Verdict::Allow));
}

#[tokio::test]
async fn discord_invite_is_flagged_when_the_invite_filter_is_on() {
    let (_t, pipeline) = automod_with(|c| c.link_filter = false);
    assert!(matches!(
        pipeline.evaluate("user-i", "come join us at discord.gg/xyz789", &[]),
        Verdict::Delete(crosschat::automod::Reason::DiscordInvite)
    ));
}

#[tokio::test]
async fn profanity_pattern_is_flagged() {
    let (_t, pipeline) = automod_with(|c| {
        c.link_filter = false;
        c.invite_filter = false;
    });
    assert!(matches!(
        pipeline.evaluate("user-p", "you fucking idiot", &[]),
        Verdict::Delete(crosschat::automod::Reason::Profanity)
    ));
    assert!(matches!(pipeline.evaluate("user-p2", "have a nice day", &[]), Verdict::Allow));
}

#[tokio::test]
async fn phone_number_is_flagged() {
    let (_t, pipeline) = automod_with(|c| {
        c.link_filter = false;
        c.invite_filter = false;
    });
    assert!(matches!(
        pipeline.evaluate("user-ph", "call me at 555-123-4567", &[]),
        Verdict::Delete(crosschat::automod::Reason::PhoneNumber)
    ));
}

#[tokio::test]
async fn street_address_is_flagged() {
    let (_t, pipeline) = automod_with(|c| {
        c.link_filter = false;
        c.invite_filter = false;
    });
    assert!(matches!(
        pipeline.evaluate("user-a", "I live at 123 Main Street", &[]),
        Verdict::Delete(crosschat::automod::Reason::Address)
    ));
}

//! Relay Orchestrator (C9, §4.9).
//!
//! Ties C1–C8 together for one ingress event. Per-channel serialization is
//! grounded on `routes/mod.rs`'s guard/tracker pattern, generalized here to a
//! per-channel token map (a keyed async mutex) so that two events from the
//! same source channel run steps 1–13 strictly in order, matching §5's
//! "no global lock is held on the hot path" constraint.

use crate::ban_store::BanStore;
use crate::channel_registry::ChannelRegistry;
use crate::delivery_index::DeliveryIndex;
use crate::embed::render;
use crate::error::{Outcome, RelayResult};
use crate::fingerprint::FingerprintAllocator;
use crate::gateway::{Gateway, ReactionKind};
use crate::automod::{AutomodPipeline, Verdict};
use crate::message_log::MessageLog;
use crate::models::{IngressMessage, ModerationAction, Tier};
use crate::scheduler::FanoutScheduler;
use crate::tier::TierResolver;
use crate::violation::ViolationTally;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

pub struct OrchestratorConfig {
    pub violation_warning_threshold: u32,
    pub warning_ban_threshold: u32,
    pub automod_ban_duration_mins: i64,
}

pub struct RelayOrchestrator {
    channels: Arc<ChannelRegistry>,
    bans: Arc<BanStore>,
    automod: Arc<AutomodPipeline>,
    tiers: Arc<TierResolver>,
    allocator: Arc<FingerprintAllocator>,
    message_log: Arc<MessageLog>,
    delivery_index: Arc<DeliveryIndex>,
    scheduler: Arc<FanoutScheduler>,
    gateway: Arc<dyn Gateway>,
    violations: Arc<ViolationTally>,
    config: OrchestratorConfig,
    /// Per-source-channel serialization tokens (§4.9, §5).
    channel_locks: DashMap<String, Arc<AsyncMutex<()>>>,
}

impl RelayOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channels: Arc<ChannelRegistry>,
        bans: Arc<BanStore>,
        automod: Arc<AutomodPipeline>,
        tiers: Arc<TierResolver>,
        allocator: Arc<FingerprintAllocator>,
        message_log: Arc<MessageLog>,
        delivery_index: Arc<DeliveryIndex>,
        scheduler: Arc<FanoutScheduler>,
        gateway: Arc<dyn Gateway>,
        violations: Arc<ViolationTally>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            channels,
            bans,
            automod,
            tiers,
            allocator,
            message_log,
            delivery_index,
            scheduler,
            gateway,
            violations,
            config,
            channel_locks: DashMap::new(),
        }
    }

    fn channel_lock(&self, channel_id: &str) -> Arc<AsyncMutex<()>> {
        self.channel_locks
            .entry(channel_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Process one ingress event (§4.9 steps 1–14).
    pub async fn handle(&self, msg: IngressMessage) -> RelayResult<Outcome> {
        // Step 1: drop bot/not-in-a-server/empty-content-no-attachment messages.
        if msg.author_is_bot
            || !msg.in_server
            || (msg.content.trim().is_empty() && msg.attachments.is_empty())
        {
            return Ok(Outcome::Failed { cc_id: String::new() });
        }

        // Per-channel serialization (§4.9, §5): acquire before any further step.
        let lock = self.channel_lock(&msg.source_channel_id);
        let _guard = lock.lock().await;

        // Step 2: privacy gate.
        if !self.channels.is_relay_channel(&msg.source_channel_id) {
            return Ok(Outcome::Failed { cc_id: String::new() });
        }

        // Step 3: duplicate gate — another replica may have already handled this.
        if let Some(existing) = self.allocator.lookup_by_source_id(&msg.source_message_id)? {
            return Ok(Outcome::Processed {
                cc_id: existing.cc_id,
                delivered: self.delivery_index.count_for_cc_id(&existing.cc_id)?,
            });
        }

        // Step 4: processing indicator.
        self.gateway
            .react(&msg.source_channel_id, &msg.source_message_id, ReactionKind::Processing)
            .await
            .ok();

        // Step 5: tier resolution.
        let tier_info = self
            .tiers
            .resolve(&msg.source_user_id, &msg.author_role_ids, &msg.source_server_id);

        // Step 6: ban gates.
        if self.bans.is_user_banned(&msg.source_user_id)? {
            self.gateway
                .react(&msg.source_channel_id, &msg.source_message_id, ReactionKind::Banned)
                .await
                .ok();
            self.gateway
                .dm_user(&msg.source_user_id, "You are banned from the relay network.")
                .await
                .ok();
            return Ok(Outcome::Banned);
        }
        if self.bans.is_server_banned(&msg.source_server_id)? {
            return Ok(Outcome::ServerBanned);
        }

        // Step 7: automod — Standard tier always runs it; higher tiers run it
        // too but with reduced telemetry (§4.9 step 7).
        let verdict = self
            .automod
            .evaluate(&msg.source_user_id, &msg.content, &msg.author_role_ids);
        if let Verdict::Delete(reason) | Verdict::Warn(reason) = &verdict {
            let count = self.violations.record(&msg.source_user_id, reason.notice_category());
            if matches!(verdict, Verdict::Delete(_)) {
                self.gateway
                    .react(&msg.source_channel_id, &msg.source_message_id, ReactionKind::Blocked)
                    .await
                    .ok();
                self.gateway
                    .delete_source(&msg.source_channel_id, &msg.source_message_id)
                    .await
                    .ok();
                self.gateway
                    .dm_user(
                        &msg.source_user_id,
                        &format!("Your message was removed: {}", reason.notice_category()),
                    )
                    .await
                    .ok();
                self.allocator_log(ModerationAction::AutomodDelete, &msg.source_user_id, reason.notice_category())?;

                if count % self.config.violation_warning_threshold == 0 {
                    // Total warnings = persisted count (fleet-wide, survives restarts)
                    // plus this replica's tally-derived count (§4.5: "total" warnings).
                    let persisted_warnings = self.message_log.count_action(&msg.source_user_id, "automod_warn")?;
                    self.allocator_log(ModerationAction::AutomodWarn, &msg.source_user_id, reason.notice_category())?;
                    let tally_warnings = count / self.config.violation_warning_threshold;
                    let total_warnings = persisted_warnings + tally_warnings as i64;
                    if total_warnings >= self.config.warning_ban_threshold as i64 {
                        self.bans.ban_user(
                            &msg.source_user_id,
                            "automated: repeated automod violations",
                            "automod",
                            Some(self.config.automod_ban_duration_mins),
                        )?;
                        self.violations.reset(&msg.source_user_id);
                        info!(user_id = %msg.source_user_id, "automod escalation: service ban applied");
                    }
                }
                return Ok(Outcome::Blocked { reason: reason.notice_category().to_string() });
            }
        }

        // Step 8: allocate CC-ID. If someone else already won the race for
        // this source message, report processed without re-delivering.
        let (cc_id, freshly_allocated) = self.allocator.assign(
            &msg,
            tier_info.priority,
            tier_info.tier.display_tag(),
            tier_info.tier.is_vip(),
        )?;
        if !freshly_allocated {
            self.gateway
                .clear_reaction(&msg.source_channel_id, &msg.source_message_id, ReactionKind::Processing)
                .await
                .ok();
            self.gateway
                .react(&msg.source_channel_id, &msg.source_message_id, ReactionKind::Success)
                .await
                .ok();
            return Ok(Outcome::Processed {
                delivered: self.delivery_index.count_for_cc_id(&cc_id)?,
                cc_id,
            });
        }

        // Step 9: render embed.
        let embed = render(&msg, tier_info.tier, &cc_id);

        // Step 10: targets = active channels minus source.
        let targets: Vec<String> = self
            .channels
            .list_active()
            .into_iter()
            .filter(|c| c != &msg.source_channel_id)
            .collect();

        // Step 11: deliver.
        let is_founder = tier_info.tier == Tier::Founder;
        let delivered = self
            .scheduler
            .deliver(
                &cc_id,
                &msg.source_message_id,
                &embed,
                &msg.attachments,
                &targets,
                tier_info.priority,
                is_founder,
            )
            .await;

        // Step 13: replace processing reaction with the outcome.
        let result_reaction = if delivered > 0 { ReactionKind::Success } else { ReactionKind::Failure };
        self.gateway
            .clear_reaction(&msg.source_channel_id, &msg.source_message_id, ReactionKind::Processing)
            .await
            .ok();
        self.gateway
            .react(&msg.source_channel_id, &msg.source_message_id, result_reaction)
            .await
            .ok();

        if delivered == 0 {
            warn!(cc_id, "relay produced zero deliveries");
            return Ok(Outcome::Failed { cc_id });
        }

        Ok(Outcome::Processed { cc_id, delivered })
    }

    fn allocator_log(&self, action: ModerationAction, target_id: &str, reason: &str) -> RelayResult<()> {
        self.message_log.log_action(action, target_id, Some("automod"), reason)
    }
}

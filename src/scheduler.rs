//! Fan-out Scheduler (C8, §4.7).
//!
//! Grounded on `routes/broadcast.rs`'s `broadcast_message` handler — the
//! closest teacher analogue to "iterate targets, tally success/failure per
//! target" — generalized from its single sequential loop into the tiered
//! parallel/sequential split §4.7 requires. The parallel "wait all" path is
//! modeled after `webhooks.rs`'s per-delivery `tokio::spawn`, but joined with
//! a barrier instead of fire-and-forget, since a Delivery Index write must
//! complete before the source event counts as fully relayed.

use crate::delivery_index::DeliveryIndex;
use crate::embed::RenderedEmbed;
use crate::gateway::Gateway;
use crate::models::Attachment;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct SchedulerConfig {
    pub delay_founder_ms: u64,
    pub delay_elite_ms: u64,
    pub delay_architect_ms: u64,
    pub delay_partner_ms: u64,
    pub delay_standard_ms: u64,
    pub send_timeout_ms: u64,
}

pub struct FanoutScheduler {
    gateway: Arc<dyn Gateway>,
    delivery_index: Arc<DeliveryIndex>,
    config: SchedulerConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Parallel(u64),
    Sequential(u64),
}

impl FanoutScheduler {
    pub fn new(gateway: Arc<dyn Gateway>, delivery_index: Arc<DeliveryIndex>, config: SchedulerConfig) -> Self {
        Self { gateway, delivery_index, config }
    }

    fn mode_for(&self, priority: u32, is_founder: bool) -> Mode {
        match priority {
            10 if is_founder => Mode::Parallel(self.config.delay_founder_ms),
            10 => Mode::Parallel(self.config.delay_elite_ms),
            25 => Mode::Parallel(self.config.delay_architect_ms),
            75 => Mode::Parallel(self.config.delay_partner_ms),
            _ => Mode::Sequential(self.config.delay_standard_ms),
        }
    }

    /// Deliver `embed` to every target, per the tiered pacing/concurrency
    /// table in §4.7. Returns the count of successful deliveries (the
    /// authoritative Delivery Index write count, not the platform send count).
    pub async fn deliver(
        &self,
        cc_id: &str,
        source_message_id: &str,
        embed: &RenderedEmbed,
        attachments: &[Attachment],
        targets: &[String],
        priority: u32,
        is_founder: bool,
    ) -> usize {
        let timeout = Duration::from_millis(self.config.send_timeout_ms);
        match self.mode_for(priority, is_founder) {
            Mode::Parallel(delay_ms) => {
                if delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
                let sends = targets.iter().map(|target| {
                    self.send_one(cc_id, source_message_id, target, embed, attachments, timeout, false)
                });
                let results = futures_util::future::join_all(sends).await;
                results.into_iter().filter(|ok| *ok).count()
            }
            Mode::Sequential(delay_ms) => {
                let mut delivered = 0;
                for (i, target) in targets.iter().enumerate() {
                    if i > 0 && delay_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                    if self
                        .send_one(cc_id, source_message_id, target, embed, attachments, timeout, true)
                        .await
                    {
                        delivered += 1;
                    }
                }
                delivered
            }
        }
    }

    /// `log_failures` distinguishes the two per-tier failure policies in
    /// §4.7's table: parallel tiers (Elite/Architect/Partner/Founder) count
    /// failures silently, Standard's sequential path logs them.
    async fn send_one(
        &self,
        cc_id: &str,
        source_message_id: &str,
        target: &str,
        embed: &RenderedEmbed,
        attachments: &[Attachment],
        timeout: Duration,
        log_failures: bool,
    ) -> bool {
        let send = self.gateway.send_embed(target, embed, attachments);
        match tokio::time::timeout(timeout, send).await {
            Ok(Ok(delivered_message_id)) => {
                match self
                    .delivery_index
                    .record(cc_id, target, &delivered_message_id, Some(source_message_id))
                {
                    Ok(()) => true,
                    Err(e) => {
                        if log_failures {
                            warn!(cc_id, target, error = %e, "delivery index write failed");
                        }
                        false
                    }
                }
            }
            Ok(Err(e)) => {
                if log_failures {
                    warn!(cc_id, target, error = %e, "send failed");
                }
                false
            }
            Err(_) => {
                if log_failures {
                    warn!(cc_id, target, "send timed out");
                }
                false
            }
        }
    }
}

//! Edit/Delete Propagator (C10, §4.10).
//!
//! Grounded on `routes/messages.rs`'s `edit_message`/`delete_message`
//! handlers (trust checks, in-place content update), generalized from a
//! single local room to fanning the mutation out across every Delivery
//! Record for a CC-ID.

use crate::delivery_index::DeliveryIndex;
use crate::embed::{render, with_edited_content};
use crate::error::RelayResult;
use crate::fingerprint::FingerprintAllocator;
use crate::gateway::{Gateway, ReactionKind};
use crate::message_log::MessageLog;
use crate::models::{IngressMessage, Tier};
use std::sync::Arc;
use tracing::warn;

pub struct EditDeletePropagator {
    channels: Arc<crate::channel_registry::ChannelRegistry>,
    allocator: Arc<FingerprintAllocator>,
    message_log: Arc<MessageLog>,
    delivery_index: Arc<DeliveryIndex>,
    gateway: Arc<dyn Gateway>,
}

impl EditDeletePropagator {
    pub fn new(
        channels: Arc<crate::channel_registry::ChannelRegistry>,
        allocator: Arc<FingerprintAllocator>,
        message_log: Arc<MessageLog>,
        delivery_index: Arc<DeliveryIndex>,
        gateway: Arc<dyn Gateway>,
    ) -> Self {
        Self { channels, allocator, message_log, delivery_index, gateway }
    }

    /// Propagate a source-message edit to every delivered copy (§4.10 Edit).
    pub async fn propagate_edit(&self, edited: &IngressMessage, source_channel_id: &str) -> RelayResult<()> {
        if !self.channels.is_relay_channel(source_channel_id) {
            return Ok(());
        }

        let Some(record) = self.allocator.lookup_by_source_id(&edited.source_message_id)? else {
            return Ok(());
        };
        if record.is_deleted {
            return Ok(());
        }

        self.message_log.update_content(&edited.source_message_id, &edited.content)?;

        let tier = tier_from_tag(&record.tag_name);
        let base_embed = render(edited, tier, &record.cc_id);
        let edited_embed = with_edited_content(base_embed, &edited.content);

        for delivery in self.delivery_index.for_cc_id(&record.cc_id)? {
            if let Err(e) = self
                .gateway
                .edit_embed(&delivery.target_channel_id, &delivery.delivered_message_id, &edited_embed)
                .await
            {
                warn!(cc_id = %record.cc_id, target = %delivery.target_channel_id, error = %e, "edit propagation failed");
            }
        }

        self.gateway
            .react(source_channel_id, &edited.source_message_id, ReactionKind::Edited)
            .await
            .ok();

        Ok(())
    }

    /// Operator global delete by CC-ID (§4.10 Global delete). Idempotent:
    /// repeated calls on an already-deleted CC-ID return success with count 0.
    pub async fn global_delete(&self, cc_id: &str, operator_id: &str) -> RelayResult<usize> {
        let Some(record) = self.allocator.lookup_by_cc_id(cc_id)? else {
            return Ok(0);
        };
        if record.is_deleted {
            return Ok(0);
        }

        let deliveries = self.delivery_index.for_cc_id(cc_id)?;
        let mut deleted_count = 0;
        for delivery in &deliveries {
            match self
                .gateway
                .delete_message(&delivery.target_channel_id, &delivery.delivered_message_id)
                .await
            {
                Ok(()) => deleted_count += 1,
                Err(e) => warn!(cc_id, target = %delivery.target_channel_id, error = %e, "delete propagation failed, marking unreachable"),
            }
        }

        self.message_log.mark_deleted(cc_id, operator_id, deleted_count)?;
        Ok(deleted_count)
    }
}

fn tier_from_tag(tag_name: &str) -> Tier {
    match tag_name {
        "Founder" => Tier::Founder,
        "Staff" => Tier::Staff,
        "Elite" => Tier::Elite,
        "Architect" => Tier::Architect,
        "Partner" => Tier::Partner,
        _ => Tier::Standard,
    }
}

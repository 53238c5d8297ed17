//! Crate root: wires C1-C11 together into a single `Relay`, the analogue of
//! the teacher's `rocket()`/`build_rocket()` construction functions.
//!
//! There is no HTTP surface left in core scope (§1), so construction produces
//! a plain struct of `Arc`-shared components instead of a `rocket::Rocket`.

pub mod automod;
pub mod ban_store;
pub mod channel_registry;
pub mod config;
pub mod db;
pub mod delivery_index;
pub mod embed;
pub mod error;
pub mod fingerprint;
pub mod gateway;
pub mod message_log;
pub mod models;
pub mod orchestrator;
pub mod propagator;
pub mod scheduler;
pub mod tier;
pub mod violation;
pub mod vote;

use automod::{AutomodConfig, AutomodPipeline};
use ban_store::BanStore;
use channel_registry::ChannelRegistry;
use config::Config;
use db::Db;
use delivery_index::DeliveryIndex;
use fingerprint::FingerprintAllocator;
use gateway::Gateway;
use message_log::MessageLog;
use orchestrator::{OrchestratorConfig, RelayOrchestrator};
use propagator::EditDeletePropagator;
use scheduler::{FanoutScheduler, SchedulerConfig};
use std::sync::Arc;
use tier::{TierResolver, TierResolverConfig};
use violation::ViolationTally;
use vote::VoteStore;

/// Every constructed-once component of the relay engine, assembled from a
/// `Config` and an injected `Gateway` implementation (§4.11, §4.12).
pub struct Relay {
    pub db: Arc<Db>,
    pub channels: Arc<ChannelRegistry>,
    pub bans: Arc<BanStore>,
    pub automod: Arc<AutomodPipeline>,
    pub tiers: Arc<TierResolver>,
    pub allocator: Arc<FingerprintAllocator>,
    pub message_log: Arc<MessageLog>,
    pub delivery_index: Arc<DeliveryIndex>,
    pub scheduler: Arc<FanoutScheduler>,
    pub violations: Arc<ViolationTally>,
    pub orchestrator: Arc<RelayOrchestrator>,
    pub propagator: Arc<EditDeletePropagator>,
    pub votes: Arc<VoteStore>,
}

impl Relay {
    /// Build every component from `config`, injecting `gateway` as the seam
    /// to the chat-platform client (§4.11).
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Self {
        let db = Arc::new(Db::new(&config.store_path));

        let channels = Arc::new(ChannelRegistry::new(db.clone(), config.cache_ttl_secs));
        let bans = Arc::new(BanStore::new(db.clone(), config.cache_ttl_secs));
        let automod = AutomodPipeline::new(db.clone(), AutomodConfig {
            spam_threshold: config.automod_spam_threshold,
            duplicate_threshold: config.automod_duplicate_threshold,
            caps_threshold_pct: config.automod_caps_threshold_pct,
            link_filter: config.automod_link_filter,
            invite_filter: config.automod_invite_filter,
            cache_ttl_secs: config.cache_ttl_secs,
        });
        let tiers = Arc::new(TierResolver::new(TierResolverConfig {
            owner_user_id: config.owner_user_id.clone(),
            staff_role_id: config.staff_role_id.clone(),
            elite_role_id: config.elite_role_id.clone(),
            architect_role_id: config.architect_role_id.clone(),
        }));
        let allocator = Arc::new(FingerprintAllocator::new(db.clone(), config.allocator_max_retries));
        let message_log = Arc::new(MessageLog::new(db.clone(), allocator.clone()));
        let delivery_index = Arc::new(DeliveryIndex::new(db.clone()));
        let scheduler = Arc::new(FanoutScheduler::new(
            gateway.clone(),
            delivery_index.clone(),
            SchedulerConfig {
                delay_founder_ms: config.delay_founder_ms,
                delay_elite_ms: config.delay_elite_ms,
                delay_architect_ms: config.delay_architect_ms,
                delay_partner_ms: config.delay_partner_ms,
                delay_standard_ms: config.delay_standard_ms,
                send_timeout_ms: config.send_timeout_ms,
            },
        ));
        let violations = Arc::new(ViolationTally::new());

        let orchestrator = Arc::new(RelayOrchestrator::new(
            channels.clone(),
            bans.clone(),
            automod.clone(),
            tiers.clone(),
            allocator.clone(),
            message_log.clone(),
            delivery_index.clone(),
            scheduler.clone(),
            gateway.clone(),
            violations.clone(),
            OrchestratorConfig {
                violation_warning_threshold: config.violation_warning_threshold,
                warning_ban_threshold: config.warning_ban_threshold,
                automod_ban_duration_mins: config.automod_ban_duration_mins,
            },
        ));

        let propagator = Arc::new(EditDeletePropagator::new(
            channels.clone(),
            allocator.clone(),
            message_log.clone(),
            delivery_index.clone(),
            gateway.clone(),
        ));

        let votes = Arc::new(VoteStore::new(db.clone()));

        Self {
            db,
            channels,
            bans,
            automod,
            tiers,
            allocator,
            message_log,
            delivery_index,
            scheduler,
            violations,
            orchestrator,
            propagator,
            votes,
        }
    }
}

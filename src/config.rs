//! Environment-driven configuration, loaded once at startup.
//!
//! Follows the same `if let Ok(val) = env::var(...) && let Ok(n) = val.parse()`
//! shape the teacher uses for its rate-limit config, extended to every tunable
//! named across the component design.

use crate::error::RelayError;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Chat-platform bot token. Missing is fatal.
    pub gateway_token: String,
    /// SQLite file path backing the persistence store. Missing is fatal.
    pub store_path: String,

    pub owner_user_id: String,
    pub staff_role_id: Option<String>,
    pub elite_role_id: Option<String>,
    pub architect_role_id: Option<String>,
    pub support_server_id: Option<String>,
    pub vote_webhook_secret: Option<String>,

    /// Channel registry / ban store / automod regex cache TTL, seconds.
    pub cache_ttl_secs: u64,

    pub automod_spam_threshold: usize,
    pub automod_duplicate_threshold: usize,
    pub automod_caps_threshold_pct: f64,
    pub automod_link_filter: bool,
    pub automod_invite_filter: bool,

    pub violation_warning_threshold: u32,
    pub warning_ban_threshold: u32,
    pub automod_ban_duration_mins: i64,

    pub allocator_max_retries: u32,

    /// Pre-send delay per scheduler priority tier, milliseconds.
    pub delay_founder_ms: u64,
    pub delay_elite_ms: u64,
    pub delay_architect_ms: u64,
    pub delay_partner_ms: u64,
    pub delay_standard_ms: u64,
    /// Per-send timeout, all tiers.
    pub send_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_token: String::new(),
            store_path: "crosschat.db".to_string(),
            owner_user_id: String::new(),
            staff_role_id: None,
            elite_role_id: None,
            architect_role_id: None,
            support_server_id: None,
            vote_webhook_secret: None,
            cache_ttl_secs: 900,
            automod_spam_threshold: 3,
            automod_duplicate_threshold: 3,
            automod_caps_threshold_pct: 70.0,
            automod_link_filter: true,
            automod_invite_filter: true,
            violation_warning_threshold: 3,
            warning_ban_threshold: 3,
            automod_ban_duration_mins: 20,
            allocator_max_retries: 3,
            delay_founder_ms: 0,
            delay_elite_ms: 250,
            delay_architect_ms: 500,
            delay_partner_ms: 750,
            delay_standard_ms: 100,
            send_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load configuration from the environment, failing fatally on missing
    /// required values. Every other field falls back to `Default`.
    pub fn from_env() -> Result<Self, RelayError> {
        let mut cfg = Config::default();

        cfg.gateway_token = env::var("CROSSCHAT_TOKEN")
            .map_err(|_| RelayError::InvalidConfig("CROSSCHAT_TOKEN is required".to_string()))?;
        cfg.store_path = env::var("CROSSCHAT_STORE_PATH")
            .map_err(|_| RelayError::InvalidConfig("CROSSCHAT_STORE_PATH is required".to_string()))?;

        if let Ok(v) = env::var("CROSSCHAT_OWNER_ID") {
            cfg.owner_user_id = v;
        }
        if let Ok(v) = env::var("CROSSCHAT_STAFF_ROLE_ID") {
            cfg.staff_role_id = Some(v);
        }
        if let Ok(v) = env::var("CROSSCHAT_ELITE_ROLE_ID") {
            cfg.elite_role_id = Some(v);
        }
        if let Ok(v) = env::var("CROSSCHAT_ARCHITECT_ROLE_ID") {
            cfg.architect_role_id = Some(v);
        }
        if let Ok(v) = env::var("CROSSCHAT_SUPPORT_SERVER_ID") {
            cfg.support_server_id = Some(v);
        }
        if let Ok(v) = env::var("CROSSCHAT_VOTE_WEBHOOK_SECRET") {
            cfg.vote_webhook_secret = Some(v);
        }

        if let Ok(val) = env::var("CROSSCHAT_CACHE_TTL_SECS")
            && let Ok(n) = val.parse()
        {
            cfg.cache_ttl_secs = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_AUTOMOD_SPAM_THRESHOLD")
            && let Ok(n) = val.parse()
        {
            cfg.automod_spam_threshold = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_AUTOMOD_DUPLICATE_THRESHOLD")
            && let Ok(n) = val.parse()
        {
            cfg.automod_duplicate_threshold = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_AUTOMOD_CAPS_THRESHOLD_PCT")
            && let Ok(n) = val.parse()
        {
            cfg.automod_caps_threshold_pct = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_AUTOMOD_LINK_FILTER")
            && let Ok(n) = val.parse()
        {
            cfg.automod_link_filter = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_AUTOMOD_INVITE_FILTER")
            && let Ok(n) = val.parse()
        {
            cfg.automod_invite_filter = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_VIOLATION_WARNING_THRESHOLD")
            && let Ok(n) = val.parse()
        {
            cfg.violation_warning_threshold = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_WARNING_BAN_THRESHOLD")
            && let Ok(n) = val.parse()
        {
            cfg.warning_ban_threshold = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_AUTOMOD_BAN_DURATION_MINS")
            && let Ok(n) = val.parse()
        {
            cfg.automod_ban_duration_mins = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_ALLOCATOR_MAX_RETRIES")
            && let Ok(n) = val.parse()
        {
            cfg.allocator_max_retries = n;
        }
        if let Ok(val) = env::var("CROSSCHAT_SEND_TIMEOUT_MS")
            && let Ok(n) = val.parse()
        {
            cfg.send_timeout_ms = n;
        }

        Ok(cfg)
    }
}

//! Data model types for the relay engine (spec §3).
//!
//! Mirrors the teacher's style of plain serde-derived structs with small
//! `default_x()` helpers for optional fields, rather than builder types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Founder,
    Staff,
    Elite,
    Architect,
    Partner,
    Standard,
}

impl Tier {
    /// Scheduler priority hint — lower is faster (§4.6).
    pub fn priority(self) -> u32 {
        match self {
            Tier::Founder | Tier::Elite => 10,
            Tier::Architect => 25,
            Tier::Partner => 75,
            Tier::Staff => 100,
            Tier::Standard => 100,
        }
    }

    pub fn display_tag(self) -> &'static str {
        match self {
            Tier::Founder => "Founder",
            Tier::Staff => "Staff",
            Tier::Elite => "Elite",
            Tier::Architect => "Architect",
            Tier::Partner => "Partner",
            Tier::Standard => "Standard",
        }
    }

    /// Embed color per §4.8, as an 0xRRGGBB value.
    pub fn embed_color(self) -> u32 {
        match self {
            Tier::Founder => 0xDC143C,   // crimson
            Tier::Staff => 0x800080,     // purple
            Tier::Elite => 0xFF8C00,     // orange
            Tier::Architect => 0xFFD700, // gold
            Tier::Partner => 0x008080,   // teal
            Tier::Standard => 0x4169E1,  // blue
        }
    }

    pub fn is_vip(self) -> bool {
        matches!(self, Tier::Elite | Tier::Architect)
    }
}

/// Resolved tier plus its scheduler priority (Staff stacks with a VIP role for priority).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierInfo {
    pub tier: Tier,
    pub priority: u32,
}

/// One registered relay channel (§3 Channel Entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub server_id: String,
    pub channel_id: String,
    pub server_name: String,
    pub channel_name: String,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// A banned user (§3 Banned User).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannedUser {
    pub user_id: String,
    pub reason: String,
    pub moderator_id: String,
    /// Ban duration in minutes; `None` means permanent.
    pub duration_mins: Option<i64>,
    pub banned_at: String,
    pub active: bool,
}

/// A banned server (§3 Banned Server).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannedServer {
    pub server_id: String,
    pub reason: String,
    pub moderator_id: String,
    pub banned_at: String,
    pub active: bool,
}

/// A relayed source message and its network-wide identity (§3 Message Record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub source_message_id: String,
    pub cc_id: String,
    pub source_user_id: String,
    pub source_user_display_name: String,
    pub source_server_id: String,
    pub source_channel_id: String,
    pub content: String,
    pub tag_level: u32,
    pub tag_name: String,
    pub is_vip: bool,
    pub created_at: String,
    pub is_deleted: bool,
    pub deleted_at: Option<String>,
    pub deleted_by: Option<String>,
}

/// One copy of a relayed message delivered into a target channel (§3 Delivery Record).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub cc_id: String,
    pub target_channel_id: String,
    pub delivered_message_id: String,
    pub delivered_at: String,
    pub source_message_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhitelistKind {
    User,
    Role,
}

/// An automod bypass entry (§3 Automod Whitelist Entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomodWhitelistEntry {
    pub kind: WhitelistKind,
    pub identifier: String,
    pub added_at: String,
    pub added_by: String,
}

/// A partnered server entitled to Partner-tier priority (§3 Partner Server Entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerServerEntry {
    pub server_id: String,
    pub server_name: String,
    pub boost_delay_ms: u64,
    pub partnered_at: String,
    pub partnered_by: String,
}

/// A durable audit row for moderation actions (§3 Moderation Log Entry, supplemented).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationLogEntry {
    pub id: String,
    pub action: ModerationAction,
    pub target_kind: TargetKind,
    pub target_id: String,
    pub moderator_id: Option<String>,
    pub reason: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationAction {
    Warn,
    Ban,
    Unban,
    ServerBan,
    ServerUnban,
    Delete,
    AutomodDelete,
    AutomodWarn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetKind {
    User,
    Server,
}

/// A recorded vote from the external vote-reward webhook (§3 Vote Record, supplemented).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub user_id: String,
    pub bot_id: String,
    pub vote_type: String,
    #[serde(default)]
    pub is_weekend: bool,
    pub month_key: String,
    pub voted_at: String,
}

/// A source-side message snapshot handed to the allocator and orchestrator —
/// the in-process representation of one ingress event (§9: tagged variant, not a
/// duck-typed map).
#[derive(Debug, Clone)]
pub struct IngressMessage {
    pub source_message_id: String,
    pub source_user_id: String,
    pub source_user_display_name: String,
    pub author_avatar_url: Option<String>,
    pub author_is_bot: bool,
    /// False for a DM or other gateway event with no originating server (§4.9 step 1).
    pub in_server: bool,
    pub source_server_id: String,
    pub source_server_name: String,
    pub source_channel_id: String,
    pub source_channel_name: String,
    pub content: String,
    pub author_role_ids: Vec<String>,
    pub attachments: Vec<Attachment>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub url: String,
    pub filename: String,
    pub is_image: bool,
    pub bytes: Vec<u8>,
}

fn default_true() -> bool {
    true
}

/// Inbound payload shape for the excluded vote webhook (§6), kept here so the
/// store/verification contract is real even though the HTTP receiver is out of core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteWebhookPayload {
    pub user: String,
    pub bot: String,
    #[serde(rename = "type")]
    pub vote_type: String,
    #[serde(rename = "isWeekend", default)]
    pub is_weekend: bool,
    #[serde(default = "default_true")]
    pub verified: bool,
}

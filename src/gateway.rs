//! The trait-abstracted seam to the external chat-platform client (§4.11, C11).
//!
//! The gateway connection itself is explicitly out of core scope (§1); this
//! module only defines the outbound operations the orchestrator, scheduler,
//! and propagator need. Production wiring supplies a real implementation
//! against the platform's HTTP API; tests supply an in-memory recorder.

use crate::embed::RenderedEmbed;
use crate::models::Attachment;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Processing,
    Success,
    Failure,
    Banned,
    Blocked,
    Edited,
}

impl ReactionKind {
    pub fn emoji(self) -> &'static str {
        match self {
            ReactionKind::Processing => "⏳",
            ReactionKind::Success => "✅",
            ReactionKind::Failure => "❌",
            ReactionKind::Banned => "🚫",
            ReactionKind::Blocked => "⚠️",
            ReactionKind::Edited => "✏️",
        }
    }
}

/// Outbound operations the relay engine needs from the chat platform (§6).
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Post `embed` (plus any non-image attachments) into `channel_id`. Returns the
    /// platform-assigned id of the delivered message.
    async fn send_embed(
        &self,
        channel_id: &str,
        embed: &RenderedEmbed,
        attachments: &[Attachment],
    ) -> Result<String, String>;

    /// Replace the description of an already-delivered message.
    async fn edit_embed(&self, channel_id: &str, message_id: &str, embed: &RenderedEmbed)
        -> Result<(), String>;

    /// Delete a delivered message.
    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), String>;

    /// React to the source message with a status indicator.
    async fn react(&self, channel_id: &str, message_id: &str, kind: ReactionKind) -> Result<(), String>;

    /// Remove a previously-added reaction (used to replace the processing indicator).
    async fn clear_reaction(&self, channel_id: &str, message_id: &str, kind: ReactionKind) -> Result<(), String>;

    /// Delete the original source message (automod / ban enforcement).
    async fn delete_source(&self, channel_id: &str, message_id: &str) -> Result<(), String>;

    /// Send a direct message to a user (moderation notices).
    async fn dm_user(&self, user_id: &str, content: &str) -> Result<(), String>;
}

//! Process entry point. Loads configuration, installs the tracing subscriber,
//! and assembles the relay engine (§4.12, §6a). The chat-platform gateway
//! client itself is out of core scope (§1); this binary wires up a stub that
//! logs every outbound call, standing in for wherever a real client is
//! plugged into `Relay::new`.

use crosschat::config::Config;
use crosschat::embed::RenderedEmbed;
use crosschat::gateway::{Gateway, ReactionKind};
use crosschat::models::Attachment;
use crosschat::Relay;
use std::sync::Arc;

struct LoggingGateway;

#[async_trait::async_trait]
impl Gateway for LoggingGateway {
    async fn send_embed(
        &self,
        channel_id: &str,
        embed: &RenderedEmbed,
        _attachments: &[Attachment],
    ) -> Result<String, String> {
        tracing::info!(channel_id, author = %embed.author_line, "send_embed");
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn edit_embed(&self, channel_id: &str, message_id: &str, _embed: &RenderedEmbed) -> Result<(), String> {
        tracing::info!(channel_id, message_id, "edit_embed");
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), String> {
        tracing::info!(channel_id, message_id, "delete_message");
        Ok(())
    }

    async fn react(&self, channel_id: &str, message_id: &str, kind: ReactionKind) -> Result<(), String> {
        tracing::debug!(channel_id, message_id, emoji = kind.emoji(), "react");
        Ok(())
    }

    async fn clear_reaction(&self, channel_id: &str, message_id: &str, kind: ReactionKind) -> Result<(), String> {
        tracing::debug!(channel_id, message_id, emoji = kind.emoji(), "clear_reaction");
        Ok(())
    }

    async fn delete_source(&self, channel_id: &str, message_id: &str) -> Result<(), String> {
        tracing::info!(channel_id, message_id, "delete_source");
        Ok(())
    }

    async fn dm_user(&self, user_id: &str, content: &str) -> Result<(), String> {
        tracing::info!(user_id, content, "dm_user");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    let gateway: Arc<dyn Gateway> = Arc::new(LoggingGateway);
    let relay = Relay::new(&config, gateway);

    tracing::info!(
        store_path = %config.store_path,
        active_channels = relay.channels.list_active().len(),
        "crosschat relay engine initialized"
    );

    std::future::pending::<()>().await;
}

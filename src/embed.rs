//! Rendered embed contract (§4.8). Pure rendering — no I/O.

use crate::models::{IngressMessage, Tier};

#[derive(Debug, Clone)]
pub struct RenderedEmbed {
    pub author_line: String,
    pub author_icon_url: Option<String>,
    pub description: String,
    pub from_field: String,
    pub image_url: Option<String>,
    pub footer: String,
    pub color: u32,
    pub timestamp: String,
}

/// Render the embed for a freshly-allocated source message (§4.9 step 9).
pub fn render(msg: &IngressMessage, tier: Tier, cc_id: &str) -> RenderedEmbed {
    let vip_star = if tier.is_vip() { " ⭐" } else { "" };
    let author_line = format!(
        "[{}] {}{} • {}",
        tier.display_tag(),
        msg.source_user_display_name,
        vip_star,
        msg.source_server_name
    );

    let description = if msg.content.trim().is_empty() && !msg.attachments.is_empty() {
        "*attachment*".to_string()
    } else {
        msg.content.clone()
    };

    let first_image = msg
        .attachments
        .iter()
        .find(|a| a.is_image)
        .map(|a| a.url.clone());

    RenderedEmbed {
        author_line,
        author_icon_url: msg.author_avatar_url.clone(),
        description,
        from_field: format!("#{} • {}", msg.source_channel_name, msg.source_server_name),
        image_url: first_image,
        footer: format!("CC-{} • ID: {}", cc_id, msg.source_user_id),
        color: tier.embed_color(),
        timestamp: msg.created_at.clone(),
    }
}

/// Re-render only the description, preserving every other field (§4.10 Edit).
pub fn with_edited_content(mut embed: RenderedEmbed, new_content: &str) -> RenderedEmbed {
    embed.description = new_content.to_string();
    embed
}

//! Discord webhook payload.

use serde::Serialize;

use crate::article::ArticleMetadata;

// ============================================================================
// Fixed message identity
// ============================================================================

/// Display name of the webhook bot.
pub const BOT_USERNAME: &str = "Calpa 的自動人形";

/// Avatar shown next to the bot name.
pub const BOT_AVATAR_URL: &str = "https://assets.calpa.me/telegram/public/pfp.png";

/// Plain-text line posted above the embed.
pub const ANNOUNCEMENT: &str = "📰 Calpa 發佈新文章啦！";

/// Embed side-bar color (0x58B9FF).
pub const EMBED_COLOR: u32 = 5_814_783;

pub const FOOTER_TEXT: &str = "Calpa 的煉金工房";

// ============================================================================
// Payload types
// ============================================================================

/// Body of a webhook execution request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscordMessage {
    pub username: String,
    pub avatar_url: String,
    pub content: String,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub description: String,
    pub color: u32,
    pub footer: EmbedFooter,
    pub timestamp: String,
    pub thumbnail: EmbedThumbnail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedThumbnail {
    pub url: String,
}

impl DiscordMessage {
    /// Announce an article with a single embed.
    pub fn from_article(meta: &ArticleMetadata) -> Self {
        Self {
            username: BOT_USERNAME.to_string(),
            avatar_url: BOT_AVATAR_URL.to_string(),
            content: ANNOUNCEMENT.to_string(),
            embeds: vec![Embed {
                title: meta.title().to_string(),
                url: meta.url().to_string(),
                description: meta.description().to_string(),
                color: EMBED_COLOR,
                footer: EmbedFooter {
                    text: FOOTER_TEXT.to_string(),
                },
                timestamp: meta.timestamp().to_string(),
                thumbnail: EmbedThumbnail {
                    url: meta.thumbnail_url().to_string(),
                },
            }],
        }
    }
}

pub fn build_discord_payload(meta: &ArticleMetadata) -> DiscordMessage {
    DiscordMessage::from_article(meta)
}

//! Discord webhook payloads and delivery.

mod client;
mod payload;

pub use client::{DeliveryError, Webhook, WebhookClient};
pub use payload::{
    ANNOUNCEMENT, BOT_AVATAR_URL, BOT_USERNAME, DiscordMessage, EMBED_COLOR, Embed, EmbedFooter,
    EmbedThumbnail, FOOTER_TEXT, build_discord_payload,
};

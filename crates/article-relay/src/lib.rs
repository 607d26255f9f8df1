//! article-relay - Announces newly published articles on a Discord webhook.
//!
//! Articles arrive either through `POST /send-message` or as queue batches.
//! Both paths share the same validation, payload building and delivery code.

pub mod article;
pub mod auth;
pub mod config;
pub mod discord;
pub mod handlers;
pub mod queue;
pub mod relay;
pub mod response;
pub mod server;

//! HTTP request handlers.

mod health;
mod send_message;

pub use health::{livez, readyz, root};
pub use send_message::send_message;

//! Telegram bot integration and handlers

pub mod admin;
pub mod bot;
pub mod handlers;
pub mod replies;
pub mod schema;
pub mod types;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};

//! SQLite persistence for users, delivered videos and broadcasts

pub mod db;
pub mod migrations;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool, UsageStats, UserInfo};

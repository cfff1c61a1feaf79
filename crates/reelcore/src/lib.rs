//! reelcore - proxy-aware media extraction for the reelfetch bot
//!
//! This library holds everything the bot needs that is not Telegram-specific.
//!
//! # Module Structure
//!
//! - `config`: Startup configuration read from the environment
//! - `error`: Application and extraction error types
//! - `logging`: Logger initialization
//! - `proxy`: Proxy descriptors, the startup proxy source and the rotating pool
//! - `extract`: Client for the third-party media extraction API
//! - `platform`: Supported-platform detection for incoming links
//! - `storage`: SQLite persistence for users, videos and broadcasts

pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod platform;
pub mod proxy;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{AppError, AppResult, ExtractError};
pub use extract::{ExtractionClient, ExtractionResult};
pub use platform::{detect_platform, extract_first_url, is_valid_media_url, Platform};
pub use proxy::{load_proxies, Proxy, ProxyPool, ProxyProtocol};
pub use storage::{create_pool, get_connection, DbConnection, DbPool, UsageStats, UserInfo};

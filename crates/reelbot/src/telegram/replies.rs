//! User-facing texts
//!
//! Failure replies are chosen by substring match on the extraction error,
//! because upstream errors arrive as free-form strings.

use reelcore::{ExtractError, Platform, UsageStats};

pub const WELCOME_TEXT: &str =
    "👋 Send me a link to a reel, short or post and I will fetch the video for you.\n\nType /help to see the supported platforms.";

pub const UNSUPPORTED_LINK_TEXT: &str =
    "🤔 I can't download from this site yet. Type /help to see the supported platforms.";

pub const NO_PERMISSION_TEXT: &str = "❌ You don't have permission to run this command.";

pub const BROADCAST_USAGE_TEXT: &str = "Usage: /broadcast <message>";

pub const GENERIC_FAILURE_TEXT: &str = "❌ Failed to process the URL. Please try again.";

pub fn help_text() -> String {
    let platforms = Platform::supported()
        .map(|p| p.display_name())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Send me a link and I will reply with the video.\n\nSupported: {}.\n\nCommands:\n/start - welcome message\n/help - this text",
        platforms
    )
}

pub fn processing_text(platform: Platform) -> String {
    format!("🔄 Fetching your {} link...", platform.display_name())
}

/// Caption attached to a delivered video
pub fn success_caption(elapsed_ms: u64, platform: Platform) -> String {
    format!("⏱ {} ms | Source: {}", elapsed_ms, platform.display_name())
}

/// Maps an extraction failure to the message shown in chat
pub fn failure_reply(error: &ExtractError) -> String {
    let message = error.to_string();
    let lower = message.to_lowercase();

    if lower.contains("rate-limit") || lower.contains("login") {
        "❌ The platform is currently blocking requests. Please try again later or with a different link.".to_string()
    } else if lower.contains("not available") {
        "❌ This content is not available (private account or deleted post).".to_string()
    } else if lower.contains("timed out") || lower.contains("timeout") {
        "❌ Request timed out. Please try again.".to_string()
    } else if lower.contains("misconfigured") {
        "❌ The service is temporarily unavailable. Please try again later.".to_string()
    } else {
        format!("❌ Download failed: {}", message)
    }
}

/// Text of the admin /stats reply
pub fn stats_text(stats: &UsageStats, proxies: usize, failed_proxies: usize, top_platforms: &[(String, i64)]) -> String {
    let mut text = format!(
        "📊 Statistics\n\n👤 Users: {}\n🎬 Videos: {}\n📣 Broadcasts: {}\n",
        stats.users, stats.videos, stats.broadcasts
    );

    if proxies == 0 {
        text.push_str("🌐 Proxies: none (direct connection)\n");
    } else {
        text.push_str(&format!("🌐 Proxies: {} ({} marked failed)\n", proxies, failed_proxies));
    }

    if !top_platforms.is_empty() {
        text.push_str("\nTop platforms:\n");
        for (platform, count) in top_platforms {
            let name = platform
                .parse::<Platform>()
                .map(|p| p.display_name().to_string())
                .unwrap_or_else(|_| platform.clone());
            text.push_str(&format!("• {}: {}\n", name, count));
        }
    }
    text
}

pub fn broadcast_summary(sent: u32, failed: u32) -> String {
    format!("📣 Broadcast finished: {} delivered, {} failed.", sent, failed)
}

use anyhow::Result;
use std::time::Duration;
use teloxide::prelude::*;

use reelcore::storage::db::{all_user_ids, platform_breakdown, record_broadcast, stats};
use reelcore::get_connection;

use super::replies;
use super::types::HandlerDeps;

/// Pause between broadcast messages (Telegram allows ~30 msg/s)
const BROADCAST_DELAY: Duration = Duration::from_millis(50);

/// Number of platforms listed by /stats
const TOP_PLATFORMS: usize = 5;

fn sender_id(msg: &Message) -> i64 {
    msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0)
}

/// Handle /stats command - usage counters and proxy pool state (admin only)
pub async fn handle_stats_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<()> {
    if !deps.config.is_admin(sender_id(msg)) {
        bot.send_message(msg.chat.id, replies::NO_PERMISSION_TEXT).await?;
        return Ok(());
    }

    let conn = get_connection(&deps.db_pool)?;
    let usage = stats(&conn)?;
    let top = platform_breakdown(&conn, TOP_PLATFORMS)?;
    drop(conn);

    let pool = deps.extractor.pool();
    let text = replies::stats_text(&usage, pool.len(), pool.failed_count(), &top);
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /broadcast command - send a text to every known user (admin only)
pub async fn handle_broadcast_command(bot: &Bot, msg: &Message, deps: &HandlerDeps, text: &str) -> Result<()> {
    let admin_id = sender_id(msg);
    if !deps.config.is_admin(admin_id) {
        bot.send_message(msg.chat.id, replies::NO_PERMISSION_TEXT).await?;
        return Ok(());
    }

    let text = text.trim();
    if text.is_empty() {
        bot.send_message(msg.chat.id, replies::BROADCAST_USAGE_TEXT).await?;
        return Ok(());
    }

    let recipients = {
        let conn = get_connection(&deps.db_pool)?;
        all_user_ids(&conn)?
    };
    log::info!("📣 Broadcast by {} to {} users", admin_id, recipients.len());

    let mut sent = 0u32;
    let mut failed = 0u32;
    for user_id in recipients {
        match bot.send_message(ChatId(user_id), text).await {
            Ok(_) => sent += 1,
            Err(e) => {
                log::warn!("Broadcast to {} failed: {}", user_id, e);
                failed += 1;
            }
        }
        tokio::time::sleep(BROADCAST_DELAY).await;
    }

    {
        let conn = get_connection(&deps.db_pool)?;
        record_broadcast(&conn, admin_id, text, sent, failed)?;
    }
    log::info!("📣 Broadcast finished: {} sent, {} failed", sent, failed);

    bot.send_message(msg.chat.id, replies::broadcast_summary(sent, failed)).await?;
    Ok(())
}

//! Handlers for regular users: /start, /help and incoming links

use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, User};

use reelcore::platform::{detect_platform, extract_first_url};
use reelcore::storage::db::{save_user_and_video, upsert_user};
use reelcore::{get_connection, ExtractionResult, Platform, UserInfo};

use super::replies;
use super::types::{HandlerDeps, HandlerError};

pub fn user_info(user: &User) -> UserInfo {
    UserInfo::new(
        i64::try_from(user.id.0).unwrap_or(0),
        user.username.clone(),
        &user.first_name,
        user.last_name.as_deref(),
    )
}

/// Stores or refreshes the sender. Never fails the handler.
fn remember_user(deps: &HandlerDeps, msg: &Message) {
    let Some(user) = msg.from.as_ref() else {
        return;
    };
    let result = get_connection(&deps.db_pool).and_then(|conn| upsert_user(&conn, &user_info(user)));
    if let Err(e) = result {
        log::warn!("Failed to save user {}: {}", user.id, e);
    }
}

pub async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    remember_user(deps, msg);
    bot.send_message(msg.chat.id, replies::WELCOME_TEXT).await?;
    Ok(())
}

pub async fn handle_help_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, replies::help_text()).await?;
    Ok(())
}

/// Handle a text message that may contain a media link
///
/// - Messages without a link are ignored
/// - Links to unsupported sites get a short hint
/// - Otherwise one extraction is attempted and the video is sent by URL
pub async fn handle_link_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(link) = extract_first_url(text) else {
        log::debug!("No link in message from chat {}", msg.chat.id);
        return Ok(());
    };

    let platform = detect_platform(link);
    if platform == Platform::Unknown {
        bot.send_message(msg.chat.id, replies::UNSUPPORTED_LINK_TEXT).await?;
        return Ok(());
    }

    log::info!("📥 {} link from chat {}: {}", platform, msg.chat.id, link);
    bot.send_message(msg.chat.id, replies::processing_text(platform)).await?;

    match deps.extractor.extract(link).await {
        ExtractionResult::Success { url, elapsed_ms } => {
            deliver_video(bot, msg, deps, link, &url, elapsed_ms, platform).await?;
        }
        ExtractionResult::Failure { error, elapsed_ms } => {
            log::warn!(
                "Extraction failed for chat {} after {} ms [{}]: {}",
                msg.chat.id,
                elapsed_ms,
                error.subcategory(),
                error
            );
            bot.send_message(msg.chat.id, replies::failure_reply(&error)).await?;
        }
    }
    Ok(())
}

async fn deliver_video(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    original_url: &str,
    media_url: &str,
    elapsed_ms: u64,
    platform: Platform,
) -> Result<(), HandlerError> {
    let parsed = match url::Url::parse(media_url) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Extraction API returned an invalid media URL {}: {}", media_url, e);
            bot.send_message(msg.chat.id, replies::GENERIC_FAILURE_TEXT).await?;
            return Ok(());
        }
    };

    if let Err(e) = bot.send_chat_action(msg.chat.id, ChatAction::UploadVideo).await {
        log::debug!("Failed to send chat action: {}", e);
    }

    let sent = bot
        .send_video(msg.chat.id, InputFile::url(parsed))
        .caption(replies::success_caption(elapsed_ms, platform))
        .supports_streaming(true)
        .await;

    if let Err(e) = sent {
        log::error!("Failed to send video to chat {}: {}", msg.chat.id, e);
        bot.send_message(msg.chat.id, replies::GENERIC_FAILURE_TEXT).await?;
        return Ok(());
    }

    if let Some(user) = msg.from.as_ref() {
        let saved = get_connection(&deps.db_pool).and_then(|mut conn| {
            save_user_and_video(&mut conn, &user_info(user), media_url, Some(original_url), platform.as_ref())
        });
        if let Err(e) = saved {
            log::warn!("Failed to persist video record: {}", e);
        }
    }
    Ok(())
}

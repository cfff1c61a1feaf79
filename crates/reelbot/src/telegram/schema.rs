//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::admin::{handle_broadcast_command, handle_stats_command};
use super::bot::Command;
use super::handlers::{handle_help_command, handle_link_message, handle_start_command};
use super::replies;
use super::types::{HandlerDeps, HandlerError};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// The same schema is used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps;

    dptree::entry()
        // Command handler
        .branch(command_handler(deps_commands))
        // Message handler for links
        .branch(message_handler(deps_messages))
}

/// Handler for bot commands (/start, /help, /stats, /broadcast)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("🎯 Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => handle_start_command(&bot, &msg, &deps).await?,
                    Command::Help => handle_help_command(&bot, &msg).await?,
                    Command::Stats => {
                        if let Err(e) = handle_stats_command(&bot, &msg, &deps).await {
                            log::error!("/stats failed for chat {}: {}", msg.chat.id, e);
                            let _ = bot.send_message(msg.chat.id, format!("Error: {}", e)).await;
                        }
                    }
                    Command::Broadcast(text) => {
                        if let Err(e) = handle_broadcast_command(&bot, &msg, &deps, &text).await {
                            log::error!("/broadcast failed for chat {}: {}", msg.chat.id, e);
                            let _ = bot.send_message(msg.chat.id, format!("Error: {}", e)).await;
                        }
                    }
                }
                Ok(())
            }
        },
    ))
}

/// Handler for plain text messages carrying links
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|text| !text.starts_with('/')))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_link_message(&bot, &msg, &deps).await {
                    log::error!("Link handler failed for chat {}: {}", msg.chat.id, e);
                    let _ = bot.send_message(msg.chat.id, replies::GENERIC_FAILURE_TEXT).await;
                }
                Ok(())
            }
        })
}

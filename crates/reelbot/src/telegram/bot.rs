//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation

use reelcore::config::network;
use reelcore::Config;
use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "welcome message")]
    Start,
    #[command(description = "supported platforms")]
    Help,
    #[command(description = "usage statistics (admins only)")]
    Stats,
    #[command(description = "message every user (admins only)")]
    Broadcast(String),
}

/// Creates a Bot instance with custom or default API URL
pub fn create_bot(config: &Config) -> anyhow::Result<Bot> {
    if config.bot_token.is_empty() {
        anyhow::bail!("BOT_TOKEN is not set");
    }

    let client = ClientBuilder::new().timeout(network::telegram_timeout()).build()?;
    let bot = Bot::with_client(config.bot_token.clone(), client);

    let bot = match config.bot_api_url.as_deref() {
        Some(bot_api_url) => {
            log::info!("Using custom Bot API URL: {}", bot_api_url);
            let url = url::Url::parse(bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI. Admin commands are not advertised.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    let public: Vec<_> = Command::bot_commands()
        .into_iter()
        .filter(|c| matches!(c.command.trim_start_matches('/'), "start" | "help"))
        .collect();
    bot.set_my_commands(public).await?;
    Ok(())
}

use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use reelbot::cli::{Cli, Commands};
use reelbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use reelcore::logging::{init_logger, init_terminal_logger, log_extraction_configuration};
use reelcore::{create_pool, load_proxies, Config, ExtractionClient, ExtractionResult, ProxyPool};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, proxies, database, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();
    let config = Arc::new(Config::from_env());

    if cli.is_one_shot() {
        init_terminal_logger(config.log_level)?;
    } else {
        init_logger(&config.log_file_path, config.log_level)?;
    }

    // The proxy source is read exactly once; the pool lives for the whole process
    let loaded = load_proxies(&config);
    log_extraction_configuration(&config, &loaded);
    let pool = Arc::new(ProxyPool::new(loaded.proxies));
    let extractor = Arc::new(ExtractionClient::new(&config, Arc::clone(&pool))?);

    match cli.command {
        Some(Commands::Extract { url }) => run_extract(&extractor, &url).await,
        Some(Commands::Proxies) => {
            println!("{}", pool);
            Ok(())
        }
        Some(Commands::Run) | None => run_bot(config, extractor).await,
    }
}

/// One extraction from the command line, printed to stdout
async fn run_extract(extractor: &ExtractionClient, url: &str) -> Result<()> {
    match extractor.extract(url).await {
        ExtractionResult::Success { url, elapsed_ms } => {
            println!("✅ {} ({} ms)", url, elapsed_ms);
            Ok(())
        }
        ExtractionResult::Failure { error, elapsed_ms } => {
            anyhow::bail!("extraction failed after {} ms: {}", elapsed_ms, error)
        }
    }
}

async fn run_bot(config: Arc<Config>, extractor: Arc<ExtractionClient>) -> Result<()> {
    log::info!("Starting bot...");

    let db_pool = Arc::new(create_pool(&config.database_path)?);
    log::info!("✅ Database ready at {}", config.database_path);

    let bot = create_bot(&config)?;

    match bot.get_me().await {
        Ok(me) => log::info!("Bot username: @{}", me.username()),
        Err(e) => log::warn!("Failed to fetch bot info: {}", e),
    }

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps::new(db_pool, extractor, config);
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, schema(deps))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

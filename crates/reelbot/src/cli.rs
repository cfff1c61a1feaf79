use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reelfetch")]
#[command(author, version, about = "Telegram bot that fetches videos from social media links", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Perform one extraction from the terminal and print the result
    Extract {
        /// Link to a post/reel/video
        url: String,
    },

    /// List the proxies loaded from PROXY_FILE / PROXY_LIST
    Proxies,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// True for subcommands that finish immediately (terminal logging only)
    pub fn is_one_shot(&self) -> bool {
        matches!(self.command, Some(Commands::Extract { .. }) | Some(Commands::Proxies))
    }
}

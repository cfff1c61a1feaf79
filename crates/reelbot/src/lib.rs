//! reelbot - Telegram front end of reelfetch
//!
//! Wires the `reelcore` extraction client, proxy pool and storage into a
//! teloxide dispatcher.

pub mod cli;
pub mod telegram;

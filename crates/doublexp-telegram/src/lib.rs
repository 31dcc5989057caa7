//! Telegram bot relaying Deep Rock Galactic Double XP mission alerts.
//!
//! Mission data comes from doublexp.net. Chats subscribe with `/start` and
//! get an alert shortly after every 30 minute boundary listing the Double XP
//! missions of the window about to begin. `/current` answers on demand with
//! the missions of the running window.
//!
//! # Environment Variables
//!
//! Required:
//! - `BOT_TOKEN` (or `TELEGRAM_BOT_TOKEN`): Bot token from @BotFather
//!
//! Optional:
//! - `DATA_DIR`: Directory holding `subscribers.json` and `.env`
//! - `RUST_LOG`: Log filter (default: info for the bot crates)
//!
//! # Example
//!
//! ```no_run
//! use doublexp_core::AlertConfig;
//! use doublexp_telegram::AlertBot;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bot = AlertBot::new(AlertConfig::default(), Path::new("/path/to/data"))?;
//!     bot.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Commands
//!
//! - `/start` - Subscribe to alerts
//! - `/stop` - Unsubscribe
//! - `/current` - Missions of the running window
//! - `/help` - Show available commands

pub mod bot;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod gateway;
pub mod handlers;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use bot::{bot_token, AlertBot};
pub use dispatcher::{Clock, DeliveryReport, NotificationDispatcher};
pub use error::{Result, TelegramError};
pub use format::{AlertFormatter, AlertKind, BOT_TITLE};
pub use gateway::{Markup, MessageGateway, TelegramGateway};
pub use handlers::Command;
pub use scheduler::AlertScheduler;

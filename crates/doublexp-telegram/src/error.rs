//! Error types for the Telegram bot.

use doublexp_core::MissionError;
use doublexp_models::SubscriberId;
use doublexp_persistence::PersistenceError;
use thiserror::Error;

/// Errors that can occur in the Telegram bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided.
    #[error("Telegram bot token not set. Set BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Sending to one chat failed.
    #[error("Failed to send in chat {chat_id}: {reason}")]
    Delivery { chat_id: SubscriberId, reason: String },

    /// Mission data could not be fetched or parsed.
    #[error("Mission data error: {0}")]
    Mission(#[from] MissionError),

    /// Subscriber storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] PersistenceError),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

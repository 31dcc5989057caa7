//! Outbound message delivery.

use async_trait::async_trait;
use doublexp_models::SubscriberId;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::trace;

use crate::error::{Result, TelegramError};

/// Markup dialect of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    Plain,
    MarkdownV2,
}

/// Sends messages to chats.
///
/// Each call reports its own success or failure; callers decide whether a
/// failure matters beyond the one recipient.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, chat: SubscriberId, text: &str, markup: Markup) -> Result<()>;
}

/// Gateway over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageGateway for TelegramGateway {
    async fn send(&self, chat: SubscriberId, text: &str, markup: Markup) -> Result<()> {
        let mut req = self.bot.send_message(ChatId(chat.as_i64()), text);
        if markup == Markup::MarkdownV2 {
            req = req.parse_mode(ParseMode::MarkdownV2);
        }

        req.await.map_err(|e| TelegramError::Delivery {
            chat_id: chat,
            reason: e.to_string(),
        })?;
        trace!(chat_id = %chat, "Message sent");
        Ok(())
    }
}

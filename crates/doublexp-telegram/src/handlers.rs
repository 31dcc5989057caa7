//! Command handlers for the Telegram bot.

use std::sync::Arc;

use doublexp_models::SubscriberId;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

use crate::dispatcher::NotificationDispatcher;

/// Bot commands that can be invoked with /.
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Subscribe this chat to upcoming Double XP alerts")]
    Start,

    #[command(description = "Unsubscribe this chat")]
    Stop,

    #[command(description = "Show the Double XP missions running right now")]
    Current,

    #[command(description = "Show help message")]
    Help,
}

/// Dispatch commands to appropriate handlers.
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dispatcher: Arc<NotificationDispatcher>,
) -> ResponseResult<()> {
    let chat = SubscriberId(msg.chat.id.0);

    match cmd {
        Command::Start => {
            info!(chat_id = %chat, user = ?msg.from.as_ref().map(|u| &u.username), "User started bot");
            dispatcher.subscribe(chat).await;
        }
        Command::Stop => dispatcher.unsubscribe(chat).await,
        Command::Current => dispatcher.current(chat).await,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
    }

    Ok(())
}

/// Reply to slash-commands that did not parse.
pub async fn handle_unknown_command(bot: Bot, msg: Message) -> ResponseResult<()> {
    if let Some(text) = msg.text() {
        info!(cmd = %text, "Unrecognized command - sending response");
        bot.send_message(msg.chat.id, unknown_command_reply(text))
            .await?;
    }
    Ok(())
}

fn unknown_command_reply(text: &str) -> String {
    format!(
        "Unknown command: {}\n\nUse /help to see available commands.",
        text.split_whitespace().next().unwrap_or(text)
    )
}

/// Returns true for messages holding a command meant for this bot.
pub fn is_command_text(msg: &Message, bot_username: &str) -> bool {
    msg.text()
        .map(|t| is_addressed_command(t, bot_username))
        .unwrap_or(false)
}

/// A slash-command is ours when it is bare (`/next`) or mentions this bot
/// (`/next@drg_bot`). Commands for other bots in a group are not.
fn is_addressed_command(text: &str, bot_username: &str) -> bool {
    let Some(rest) = text.strip_prefix('/') else {
        return false;
    };
    let command = rest.split_whitespace().next().unwrap_or_default();
    match command.split_once('@') {
        Some((_, target)) => target.eq_ignore_ascii_case(bot_username),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "drg_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/stop", "drg_bot").unwrap(), Command::Stop);
        assert_eq!(Command::parse("/current@drg_bot", "drg_bot").unwrap(), Command::Current);
        assert_eq!(Command::parse("/help", "drg_bot").unwrap(), Command::Help);
    }

    #[test]
    fn test_unknown_commands_do_not_parse() {
        assert!(Command::parse("/next", "drg_bot").is_err());
        assert!(Command::parse("/current@other_bot", "drg_bot").is_err());
        assert!(Command::parse("current", "drg_bot").is_err());
    }

    #[test]
    fn test_descriptions_list_every_command() {
        let help = Command::descriptions().to_string();
        for cmd in ["/start", "/stop", "/current", "/help"] {
            assert!(help.contains(cmd), "missing {}", cmd);
        }
    }

    #[test]
    fn test_unknown_command_reply() {
        assert_eq!(
            unknown_command_reply("/next please"),
            "Unknown command: /next\n\nUse /help to see available commands."
        );
    }

    #[test]
    fn test_addressed_commands() {
        assert!(is_addressed_command("/next", "drg_bot"));
        assert!(is_addressed_command("/next please", "drg_bot"));
        assert!(is_addressed_command("/next@drg_bot", "drg_bot"));
        assert!(is_addressed_command("/next@DRG_Bot", "drg_bot"));
    }

    #[test]
    fn test_commands_for_other_bots_are_ignored() {
        assert!(!is_addressed_command("/start@other_bot", "drg_bot"));
        assert!(!is_addressed_command("/current@other_bot now", "drg_bot"));
        assert!(!is_addressed_command("hello /start", "drg_bot"));
        assert!(!is_addressed_command("", "drg_bot"));
    }
}

//! Main Telegram bot implementation.

use std::path::Path;
use std::sync::Arc;

use doublexp_core::{AlertConfig, MissionDataClient};
use doublexp_persistence::JsonSubscriberStore;
use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::utils::command::BotCommands;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dispatcher::NotificationDispatcher;
use crate::error::{Result, TelegramError};
use crate::gateway::TelegramGateway;
use crate::handlers::{handle_command, handle_unknown_command, is_command_text, Command};
use crate::scheduler::AlertScheduler;

/// Environment variables checked for the bot token, in order.
const TOKEN_ENV_VARS: [&str; 2] = ["BOT_TOKEN", "TELEGRAM_BOT_TOKEN"];

/// Reads the bot token from the environment.
pub fn bot_token() -> Result<String> {
    TOKEN_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|token| token.trim().to_string())
        .find(|token| !token.is_empty())
        .ok_or(TelegramError::NoToken)
}

/// The Double XP alert bot: command listener plus scheduled broadcasts.
pub struct AlertBot {
    /// The teloxide bot instance.
    bot: Bot,
    /// Pipeline shared by handlers and the scheduler.
    dispatcher: Arc<NotificationDispatcher>,
    scheduler: AlertScheduler,
}

impl AlertBot {
    /// Create a bot storing subscribers in `data_dir`.
    ///
    /// Requires `BOT_TOKEN` (or `TELEGRAM_BOT_TOKEN`) to be set.
    pub fn new(config: AlertConfig, data_dir: &Path) -> Result<Self> {
        let bot = Bot::new(bot_token()?);
        let store = JsonSubscriberStore::open(data_dir)?;

        let dispatcher = NotificationDispatcher::new(
            Arc::new(MissionDataClient::from_config(&config)),
            Arc::new(store),
            Arc::new(TelegramGateway::new(bot.clone())),
            config,
        );

        Ok(Self::with_dispatcher(bot, Arc::new(dispatcher)))
    }

    /// Create a bot around an existing dispatcher.
    pub fn with_dispatcher(bot: Bot, dispatcher: Arc<NotificationDispatcher>) -> Self {
        let scheduler = AlertScheduler::from_config(dispatcher.config());
        Self {
            bot,
            dispatcher,
            scheduler,
        }
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Run the command listener and the scheduler until Ctrl-C or SIGTERM.
    pub async fn run(&self) -> Result<()> {
        info!("Starting Telegram bot in polling mode...");

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!(error = %e, "Failed to register bot commands");
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = self.scheduler.clone();
        let scheduler_dispatcher = Arc::clone(&self.dispatcher);
        let scheduler_task = tokio::spawn(async move {
            scheduler.run(scheduler_dispatcher, shutdown_rx).await;
        });

        let state_for_commands = Arc::clone(&self.dispatcher);

        let handler = dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let dispatcher = Arc::clone(&state_for_commands);
                        info!(chat_id = %msg.chat.id, "Command matched: {:?}", cmd);
                        async move { handle_command(bot, msg, cmd, dispatcher).await }
                    }),
            )
            .branch(
                Update::filter_message()
                    .filter(|msg: Message, me: Me| is_command_text(&msg, me.username()))
                    .endpoint(handle_unknown_command),
            );

        info!("Bot is running! Send /start to subscribe.");

        let mut dispatcher = Dispatcher::builder(self.bot.clone(), handler)
            .default_handler(|upd| async move {
                debug!("Unhandled update: {:?}", upd.id);
            })
            .enable_ctrlc_handler()
            .build();

        let shutdown_token = dispatcher.shutdown_token();
        tokio::spawn(async move {
            wait_for_terminate().await;
            info!("Termination signal received");
            if let Ok(done) = shutdown_token.shutdown() {
                done.await;
            }
        });

        dispatcher.dispatch().await;

        info!("Stopping Telegram bot...");
        let _ = shutdown_tx.send(true);
        if let Err(e) = scheduler_task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }

        info!("Bot stopped");
        Ok(())
    }
}

#[cfg(unix)]
async fn wait_for_terminate() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_terminate() {
    std::future::pending::<()>().await;
}

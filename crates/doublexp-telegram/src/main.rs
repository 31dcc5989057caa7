//! Double XP alert bot binary.
//!
//! Start the bot with:
//! ```bash
//! BOT_TOKEN=xxx cargo run -p doublexp-telegram
//! ```

use doublexp_core::{config, AlertConfig};
use doublexp_telegram::AlertBot;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "doublexp_telegram=info,doublexp_core=info,doublexp_persistence=info,teloxide=warn";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_env_files();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(e) = config::ensure_data_dir() {
        tracing::warn!(error = %e, "Failed to create data directory");
    }
    let data_dir = config::data_dir();

    let bot = AlertBot::new(AlertConfig::default(), &data_dir)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, data_dir = %data_dir.display(), "Bot initialized successfully");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    bot.run().await?;

    Ok(())
}

//! Configuration for Double XP alerts.
//!
//! Fixed values (endpoint, window length, mutator) live in [`AlertConfig`].
//! The storage location and the bot token come from the environment.
//!
//! # Environment Variables
//!
//! - `DATA_DIR`: Directory holding `subscribers.json` (default `~/.doublexp-alerts`)
//! - `BOT_TOKEN` / `TELEGRAM_BOT_TOKEN`: Telegram bot token
//!
//! A `.env` file in the working directory or in the data directory is
//! loaded first, see [`load_env_files`].

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable for the storage directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default data directory name under home.
const DEFAULT_DATA_DIR: &str = ".doublexp-alerts";

/// Public mission data endpoint.
pub const DEFAULT_BASE_URL: &str = "https://doublexp.net";

/// Length of one mission window in minutes.
pub const DEFAULT_WINDOW_MINUTES: u32 = 30;

/// Mutator that makes a mission worth an alert.
pub const DEFAULT_MUTATOR: &str = "Double XP";

/// Season marker of the running season.
pub const CURRENT_SEASON: &str = "s0";

/// Delay after a window boundary before the scheduled alert fires.
pub const DEFAULT_TICK_OFFSET: Duration = Duration::from_secs(10);

static DATA_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the data directory.
///
/// Determined by:
/// 1. `DATA_DIR` environment variable if set
/// 2. `~/.doublexp-alerts` if home directory is available
/// 3. `.doublexp-alerts` in current directory as fallback
pub fn data_dir() -> PathBuf {
    DATA_DIR_CACHE
        .get_or_init(|| {
            std::env::var(DATA_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_DATA_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
                })
        })
        .clone()
}

/// Get the `.env` file path inside the data directory.
pub fn env_file() -> PathBuf {
    data_dir().join(".env")
}

/// Ensure the data directory exists.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_data_dir() -> std::io::Result<()> {
    let dir = data_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// Load `.env` from the working directory, then from the data directory.
///
/// Variables already set in the process environment win. Missing files are
/// not an error.
pub fn load_env_files() {
    let _ = dotenvy::dotenv();

    // DATA_DIR itself may come from the local .env, so resolve after it
    let env_path = env_file();
    if env_path.exists() {
        let _ = dotenvy::from_path(&env_path);
    }
}

/// Settings for the alert pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertConfig {
    /// Base URL of the mission data endpoint.
    pub base_url: String,
    /// Window length in minutes.
    pub window_minutes: u32,
    /// Target mutator name.
    pub mutator: String,
    /// Marker of the running season; other missions are flagged as past season.
    pub season_marker: String,
    /// Delay after each window boundary for the scheduled alert.
    pub tick_offset: Duration,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            window_minutes: DEFAULT_WINDOW_MINUTES,
            mutator: DEFAULT_MUTATOR.to_string(),
            season_marker: CURRENT_SEASON.to_string(),
            tick_offset: DEFAULT_TICK_OFFSET,
        }
    }
}

impl AlertConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the window length.
    pub fn with_window_minutes(mut self, minutes: u32) -> Self {
        self.window_minutes = minutes;
        self
    }

    /// Sets the target mutator.
    pub fn with_mutator(mut self, mutator: impl Into<String>) -> Self {
        self.mutator = mutator.into();
        self
    }

    /// Sets the tick offset.
    pub fn with_tick_offset(mut self, offset: Duration) -> Self {
        self.tick_offset = offset;
        self
    }
}

//! Double XP Core - mission pipeline shared by every alert surface.
//!
//! - **client**: Fetch mission reports from doublexp.net
//! - **config**: Pipeline settings and data directory helpers
//! - **filter**: Keep only missions with the target mutator
//! - **schema**: Typed endpoint payload
//! - **timing**: Minute offsets for window alerts

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod schema;
pub mod timing;

pub use client::{fetch_batch, MissionDataClient, MissionSource};
pub use config::{
    data_dir, ensure_data_dir, env_file, load_env_files, AlertConfig, CURRENT_SEASON,
    DEFAULT_BASE_URL, DEFAULT_MUTATOR, DEFAULT_WINDOW_MINUTES,
};
pub use error::{MissionError, Result};
pub use filter::filter_missions;
pub use schema::{parse_report, MissionReport, RawMission};
pub use timing::{elapsed_minutes, minutes_remaining, minutes_until};

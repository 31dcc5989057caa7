//! Core data models for Double XP alerts.
//!
//! This crate provides the value types shared by the fetch pipeline, the
//! subscriber store and the Telegram bot: missions, mission batches,
//! subscriber identifiers and data selectors.

pub mod ids;
pub mod mission;

// Re-export main types
pub use ids::{Selector, SubscriberId};
pub use mission::{Mission, MissionBatch};

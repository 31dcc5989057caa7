//! Error types for mission fetching.

use thiserror::Error;

/// Errors that can occur while fetching mission data.
#[derive(Error, Debug)]
pub enum MissionError {
    /// The data source could not be reached or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body is not the expected JSON shape.
    #[error("malformed mission data: {0}")]
    DataFormat(String),
}

impl From<reqwest::Error> for MissionError {
    fn from(e: reqwest::Error) -> Self {
        MissionError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for MissionError {
    fn from(e: serde_json::Error) -> Self {
        MissionError::DataFormat(e.to_string())
    }
}

/// Result type alias for mission operations.
pub type Result<T> = std::result::Result<T, MissionError>;

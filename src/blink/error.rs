//! Error types for the blink synchronizer.

use thiserror::Error;

/// Errors that can occur when starting a blink run or reading a timeline.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Blinking needs at least one selected region
    #[error("Nothing selected to blink")]
    NothingSelected,

    /// A run is already in progress on this synchronizer
    #[error("Blink synchronizer is already running")]
    AlreadyRunning,

    /// The background thread could not be started
    #[error("Failed to start blink thread: {0}")]
    Spawn(String),

    /// A timeline document could not be parsed
    #[error("Timeline parse error: {0}")]
    Timeline(#[from] serde_json::Error),
}

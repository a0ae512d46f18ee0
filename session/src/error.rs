//! Error types for the varal backend core.

use thiserror::Error;

/// Error type for session operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid connection configuration. Fatal at startup.
    #[error("varal: configuration error: {0}")]
    Config(String),

    /// Session was already started once.
    #[error("varal: session already started")]
    AlreadyStarted,

    /// Operator input is not a recognized command. Carries the original
    /// input for diagnostic display.
    #[error("varal: invalid command {0:?}, use OPEN, CLOSE or AUTO")]
    InvalidCommand(String),

    /// The broker connection is currently down; the command was not sent
    /// and will not be queued.
    #[error("varal: broker unavailable, command not sent")]
    PublishUnavailable,

    /// The transport refused the publish hand-off.
    #[error("varal: publish error: {0}")]
    Publish(String),
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for DriveSentry Core

use thiserror::Error;

/// Main error type for DriveSentry operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Tunnel error: {0}")]
    Tunnel(#[from] TunnelError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Storage-provider gateway errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Upstream returned status {status}")]
    Upstream { status: u16 },

    #[error("Malformed permission list: {0}")]
    MalformedPermissions(String),
}

/// Notification-tunnel errors
#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("Setup failed: {0}")]
    Setup(String),

    #[error("Malformed notification record: {0}")]
    MalformedNotification(String),

    #[error("Notification stream closed")]
    Closed,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Gateway(GatewayError::Transport(err.to_string()))
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

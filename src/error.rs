//! Error types for the sync daemon.
//!
//! Startup code turns these into `anyhow` errors and exits; inside the
//! reconciliation loop a failed pass is logged and the next trigger
//! starts over from scratch.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid process configuration or binding file contents
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Docker API error from bollard
    #[error("Container runtime error: {0}")]
    Runtime(#[from] bollard::errors::Error),

    /// Redis error
    #[error("Routing store error: {0}")]
    Store(#[from] redis::RedisError),

    #[error("Routing store operation timed out after {0:?}")]
    StoreTimeout(Duration),

    #[error("Container event stream failed: {0}")]
    EventStream(String),

    #[error("Container event stream ended")]
    EventStreamEnded,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Errors that only abort the current pass. Anything else is fatal for
    /// the process.
    pub fn is_pass_failure(&self) -> bool {
        matches!(
            self,
            Error::Runtime(_) | Error::Store(_) | Error::StoreTimeout(_)
        )
    }
}

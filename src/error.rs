//! Error types for the monitoring pipeline
//!
//! Stage-local failures are swallowed and logged at the run-loop level; the
//! pipeline carries no error channel, only data. The types here cover the
//! seams where an error does surface to a caller: configuration loading,
//! lifecycle misuse, and torn-down rendezvous channels.

use thiserror::Error;

/// Main error type for monitor operations.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("exchange failed: {0}")]
    Exchange(#[from] crate::exchange::ExchangeError),

    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("stage {stage} failed: {message}")]
    StageFailed {
        stage: &'static str,
        message: String,
    },

    #[error("agent {0} is not enabled")]
    NotEnabled(crate::protocol::AgentId),

    #[error("agent {0} is already enabled")]
    AlreadyEnabled(crate::protocol::AgentId),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AgentError {
    /// Create a stage failure error.
    pub fn stage_failed<S: Into<String>>(stage: &'static str, message: S) -> Self {
        Self::StageFailed {
            stage,
            message: message.into(),
        }
    }
}

/// Result type for monitor operations.
pub type AgentResult<T> = Result<T, AgentError>;

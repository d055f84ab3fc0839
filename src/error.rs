use std::time::Duration;

use thiserror::Error;

use crate::agent::AgentError;
use crate::config::ConfigError;

/// Errors that end a session before the remote command reports an exit.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{0}")]
    AgentUnreachable(AgentError),

    #[error("{0}")]
    Submission(AgentError),

    #[error("{0}")]
    EventChannel(AgentError),

    #[error("No exit status received within {}s", .0.as_secs())]
    WaitTimeout(Duration),
}

impl SessionError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

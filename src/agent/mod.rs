//! Agent-facing side: control channel, event channel and their shared types.

mod completion;
pub mod control;
pub mod events;
pub mod frame;
pub mod http;
pub mod socket;
mod types;

use thiserror::Error;

pub use completion::{completion_slot, CompletionSlot, CompletionWaiter};
pub use control::ControlChannel;
pub use events::{EventChannel, EventHandlers};
pub use http::HttpControlChannel;
pub use socket::WebSocketEventChannel;
pub use types::{
    CompletionSignal, ExecRequest, OutputEvent, ProjectDescriptor, SdkDescriptor, Signal,
    EXEC_EXIT_EVENT, EXEC_OUTPUT_EVENT,
};

/// Path prefix of every REST endpoint.
pub const API_PREFIX: &str = "/api/v1";

/// Header carrying the session identifier, both in the agent's answer and on
/// the event channel connect request.
pub const SESSION_HEADER: &str = "Xds-Agent-Sid";

/// Failures talking to the agent.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Cannot connect to {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Failed to query {endpoint}: {message}")]
    QueryFailed { endpoint: String, message: String },

    #[error("Exec request failed: {message}")]
    SubmissionFailed { message: String },

    #[error("Event channel error: {0}")]
    EventChannel(String),
}

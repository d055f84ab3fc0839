//! Control channel contract.

use async_trait::async_trait;

use crate::agent::types::{ExecRequest, ProjectDescriptor, SdkDescriptor};
use crate::agent::AgentError;

/// Request/response operations against the agent.
///
/// Calls are issued one at a time by the session; each completes (or
/// fails) before the next one starts. Nothing is retried.
#[async_trait]
pub trait ControlChannel: Send {
    /// Liveness check; returns the agent's version string.
    ///
    /// Fails with [`AgentError::Unreachable`] when the agent can't be
    /// reached. On success the connection's session identifier is known.
    async fn check_alive(&mut self) -> Result<String, AgentError>;

    /// Projects known to the agent, in agent order.
    async fn list_projects(&mut self) -> Result<Vec<ProjectDescriptor>, AgentError>;

    /// Cross SDKs installed on the agent's server, in agent order.
    async fn list_sdks(&mut self) -> Result<Vec<SdkDescriptor>, AgentError>;

    /// Submit the exec request. The result arrives on the event channel.
    async fn submit_exec(&mut self, request: &ExecRequest) -> Result<(), AgentError>;

    /// Session identifier obtained at connect time, if the agent sent one.
    fn session_id(&self) -> Option<&str>;
}

//! Remote execution session.
//!
//! One session drives exactly one exec request:
//!
//! ```text
//! Configuring → Connecting → AwaitingProjectList → Submitting → Streaming → Terminated
//!                                     ↓
//!                         help outcome (no project / --list)
//! ```
//!
//! Control calls are awaited one after another. Once the request is
//! submitted, the only thing left to do is wait for the first terminal
//! signal from the event channel.

mod help;
mod path;

pub use help::render_help;
pub use path::infer_relative_path;

use tracing::{debug, info, warn};

use crate::agent::{
    completion_slot, CompletionSignal, ControlChannel, EventChannel, EventHandlers, ExecRequest,
    ProjectDescriptor,
};
use crate::args::InvocationSpec;
use crate::config::{ConfigError, Configuration};
use crate::error::{Result, SessionError};
use crate::output::OutputSink;

/// Exit code used when the event channel closes before the command exits.
pub const CHANNEL_CLOSED_EXIT_CODE: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Configuring,
    Connecting,
    AwaitingProjectList,
    Submitting,
    Streaming,
    Terminated,
}

/// How a session ended, short of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// No project selected, or a listing was requested.
    Help { text: String, exit_code: i32 },
    /// The remote command exited. A non-empty `error` is reported but does
    /// not change the code.
    Exited { code: i32, error: Option<String> },
    /// The event channel went away first.
    ChannelClosed { error: String },
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Help { exit_code, .. } => *exit_code,
            Outcome::Exited { code, .. } => *code,
            Outcome::ChannelClosed { .. } => CHANNEL_CLOSED_EXIT_CODE,
        }
    }
}

pub struct Session<C, E> {
    control: C,
    events: E,
    config: Configuration,
    invocation: InvocationSpec,
    sink: OutputSink,
    cwd: Option<String>,
    state: SessionState,
}

impl<C: ControlChannel, E: EventChannel> Session<C, E> {
    pub fn new(
        control: C,
        events: E,
        config: Configuration,
        invocation: InvocationSpec,
        sink: OutputSink,
    ) -> Self {
        let cwd = std::env::current_dir()
            .ok()
            .map(|p| p.to_string_lossy().into_owned());
        Self {
            control,
            events,
            config,
            invocation,
            sink,
            cwd,
            state: SessionState::Configuring,
        }
    }

    /// Use `cwd` instead of the process working directory for path inference.
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session to its outcome. The event channel is closed on
    /// every path.
    pub async fn run(&mut self) -> Result<Outcome> {
        let result = self.drive().await;
        self.events.close().await;
        self.transition(SessionState::Terminated);
        result
    }

    async fn drive(&mut self) -> Result<Outcome> {
        self.transition(SessionState::Connecting);
        self.control
            .check_alive()
            .await
            .map_err(SessionError::AgentUnreachable)?;

        self.transition(SessionState::AwaitingProjectList);
        let projects = match self.control.list_projects().await {
            Ok(projects) => Some(projects),
            Err(e) => {
                warn!(error = %e, "Cannot retrieve project list");
                None
            }
        };

        if self.config.project_id.value.is_empty() || self.config.list {
            let sdks = match self.control.list_sdks().await {
                Ok(sdks) => Some(sdks),
                Err(e) => {
                    warn!(error = %e, "Cannot retrieve SDK list");
                    None
                }
            };
            let text = render_help(self.config.list, projects.as_deref(), sdks.as_deref());
            let exit_code = if self.config.list { 0 } else { 1 };
            return Ok(Outcome::Help { text, exit_code });
        }

        let (cmd, args) = match self.invocation.command() {
            Some((cmd, args)) => (cmd.to_string(), args.to_vec()),
            None => return Err(ConfigError::MissingCommand.into()),
        };

        self.transition(SessionState::Submitting);
        let (slot, waiter) = completion_slot();
        let handlers = EventHandlers::new(self.sink.clone(), slot);
        let session_id = self.control.session_id().map(str::to_string);
        self.events
            .open(session_id.as_deref(), handlers)
            .await
            .map_err(SessionError::EventChannel)?;

        let request = self.build_request(&cmd, &args, projects.as_deref().unwrap_or_default());
        self.control
            .submit_exec(&request)
            .await
            .map_err(SessionError::Submission)?;

        self.transition(SessionState::Streaming);
        let limit = self.config.wait_timeout.value;
        let Some(signal) = waiter.wait(limit).await else {
            return Err(SessionError::WaitTimeout(limit.unwrap_or_default()));
        };

        match signal {
            CompletionSignal::Exited { code, error } => {
                info!(code, "Remote command exited");
                Ok(Outcome::Exited {
                    code,
                    error: error.filter(|e| !e.is_empty()),
                })
            }
            CompletionSignal::ChannelClosed { error } => {
                info!(%error, "Event channel closed before completion");
                Ok(Outcome::ChannelClosed { error })
            }
        }
    }

    fn build_request(
        &self,
        cmd: &str,
        args: &[String],
        projects: &[ProjectDescriptor],
    ) -> ExecRequest {
        let project_id = &self.config.project_id.value;
        let mut rpath = self.config.rpath.value.clone();

        if rpath.is_empty() {
            let project = projects.iter().find(|p| &p.id == project_id);
            if let (Some(project), Some(cwd)) = (project, self.cwd.as_deref()) {
                debug!(cwd, client_path = %project.client_path, "Inferring relative path");
                if let Some(inferred) = infer_relative_path(cwd, &project.client_path) {
                    debug!(rpath = %inferred, "Relative path inferred");
                    rpath = inferred;
                }
            }
        }

        ExecRequest {
            id: project_id.clone(),
            sdk_id: self.config.sdk_id.value.clone(),
            cmd: cmd.trim_matches(' ').to_string(),
            args: args.to_vec(),
            env: self
                .config
                .extra_env
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect(),
            rpath,
            cmd_timeout: self.config.cmd_timeout.value,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A project known to the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectDescriptor {
    pub id: String,
    pub label: String,
    /// Project root on the client side, used to infer the relative path.
    pub client_path: String,
    pub default_sdk: String,
}

/// A cross SDK installed on the agent's server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SdkDescriptor {
    pub id: String,
    pub name: String,
    pub profile: String,
    pub version: String,
    pub arch: String,
}

/// The fully resolved command sent to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecRequest {
    /// Project ID.
    pub id: String,
    #[serde(rename = "sdkid")]
    pub sdk_id: String,
    pub cmd: String,
    pub args: Vec<String>,
    /// Extra environment as `KEY=value` strings.
    pub env: Vec<String>,
    /// Working directory relative to the project root.
    pub rpath: String,
    /// Seconds; enforced by the agent.
    #[serde(rename = "cmdTimeout")]
    pub cmd_timeout: u64,
}

/// One chunk of remote output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputEvent {
    pub timestamp: String,
    pub stdout: String,
    pub stderr: String,
}

/// The terminal signal of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSignal {
    /// The remote command finished.
    Exited { code: i32, error: Option<String> },
    /// The event channel went away before the command finished.
    ChannelClosed { error: String },
}

/// Everything the event channel can deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// Transport-level error; not terminal.
    Error(String),
    /// Channel lost; terminal.
    Disconnection(String),
    /// Output chunk.
    Output(OutputEvent),
    /// Remote process exit; terminal.
    Exit { code: i32, error: Option<String> },
}

/// Event name of output chunks.
pub const EXEC_OUTPUT_EVENT: &str = "exec:output";

/// Event name of the remote exit notice.
pub const EXEC_EXIT_EVENT: &str = "exec:exit";

#[derive(Default, Deserialize)]
#[serde(default)]
struct OutputMessage {
    timestamp: Value,
    stdout: String,
    stderr: String,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct ExitMessage {
    code: i32,
    error: Value,
}

impl Signal {
    /// Map a named agent event to a signal.
    ///
    /// Returns `None` for events the wrapper doesn't handle. A payload that
    /// doesn't match the expected shape becomes a non-terminal `Error`.
    pub fn from_event(name: &str, payload: Value) -> Option<Signal> {
        match name {
            EXEC_OUTPUT_EVENT => Some(
                match serde_json::from_value::<OutputMessage>(payload) {
                    Ok(msg) => Signal::Output(OutputEvent {
                        timestamp: value_text(&msg.timestamp),
                        stdout: msg.stdout,
                        stderr: msg.stderr,
                    }),
                    Err(e) => Signal::Error(format!("malformed {} event: {}", name, e)),
                },
            ),
            EXEC_EXIT_EVENT => Some(match serde_json::from_value::<ExitMessage>(payload) {
                Ok(msg) => Signal::Exit {
                    code: msg.code,
                    error: error_text(&msg.error),
                },
                Err(e) => Signal::Error(format!("malformed {} event: {}", name, e)),
            }),
            _ => None,
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Error text carried by an exit notice, if any.
///
/// Agents send either a plain string or an object with a `message` field;
/// null, empty strings and empty objects mean no error.
fn error_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("message") {
            Some(m) => value_text(m),
            None if map.is_empty() => String::new(),
            None => value.to_string(),
        },
        Value::Null => String::new(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::config::loader::ConfigError;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Explicit command-line flag.
    Flag,
    /// Env config file passed with `--config`.
    ConfigFile,
    /// Process environment.
    Env,
    /// Built-in default.
    Default,
}

/// A parameter value together with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: Source) -> Self {
        Self { value, source }
    }

    /// Transform the value, keeping the source.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Resolved<U>, E> {
        Ok(Resolved {
            value: f(self.value)?,
            source: self.source,
        })
    }
}

/// Logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    /// Accepts the usual level names; `panic` and `fatal` are kept for
    /// compatibility and mean `error`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "panic" | "fatal" | "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Values given explicitly on the command line.
///
/// Empty or absent values mean "not provided" and let lower-precedence
/// sources win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapperFlags {
    pub project_id: Option<String>,
    pub config: Option<PathBuf>,
    pub list: bool,
    pub log_level: Option<String>,
    pub rpath: Option<String>,
    pub sdk_id: Option<String>,
    pub timestamp: bool,
    pub url: Option<String>,
    pub cmd_timeout: Option<String>,
    pub wait_timeout: Option<String>,
}

/// Effective configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub project_id: Resolved<String>,
    pub sdk_id: Resolved<String>,
    pub rpath: Resolved<String>,
    /// Agent base URL, scheme included.
    pub agent_url: Resolved<Url>,
    pub log_level: Resolved<LogLevel>,
    pub timestamp: Resolved<bool>,
    /// Listing requested with `--list`; flag only.
    pub list: bool,
    /// Remote execution timeout in seconds, sent with the request.
    pub cmd_timeout: Resolved<u64>,
    /// Local limit on waiting for completion; `None` waits forever.
    pub wait_timeout: Resolved<Option<Duration>>,
    /// Env config file that was sourced, if any.
    pub config_file: Option<PathBuf>,
    /// Key/values from the env config file, forwarded to the remote command.
    pub extra_env: Vec<(String, String)>,
}

//! Parameter registry, the single source of truth for wrapper options.
//!
//! Every option the wrapper owns is described here once: its flag spelling,
//! the environment variable that can supply it, and its built-in default.
//! The resolver and the help text both read from this table.

/// A wrapper-owned parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    ProjectId,
    Config,
    List,
    LogLevel,
    RelativePath,
    SdkId,
    Timestamp,
    AgentUrl,
    CmdTimeout,
    WaitTimeout,
}

/// A single parameter definition.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub param: Param,
    /// Primary long form (e.g., "--sdkid").
    pub long: &'static str,
    /// Optional short form or alias (e.g., "-c", "--ls").
    pub short: Option<&'static str>,
    /// Environment variable consulted when the flag is empty.
    pub env_var: Option<&'static str>,
    /// Built-in default, possibly empty.
    pub default: &'static str,
    /// Human-readable description (for help text).
    pub description: &'static str,
}

/// Default agent address when nothing else is configured.
pub const DEFAULT_AGENT_URL: &str = "localhost:8000";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "error";

/// Default remote execution timeout, in seconds.
pub const DEFAULT_CMD_TIMEOUT: &str = "60";

/// Build the complete parameter registry.
pub fn param_registry() -> Vec<ParamDef> {
    vec![
        ParamDef {
            param: Param::ProjectId,
            long: "--id",
            short: None,
            env_var: Some("REMEXEC_PROJECT_ID"),
            default: "",
            description: "project ID you want to build (mandatory variable)",
        },
        ParamDef {
            param: Param::Config,
            long: "--config",
            short: Some("-c"),
            env_var: Some("REMEXEC_CONFIG"),
            default: "",
            description: "env config file to source on startup",
        },
        ParamDef {
            param: Param::List,
            long: "--list",
            short: Some("--ls"),
            env_var: None,
            default: "",
            description: "list existing projects",
        },
        ParamDef {
            param: Param::LogLevel,
            long: "--log",
            short: Some("-l"),
            env_var: Some("REMEXEC_LOGLEVEL"),
            default: DEFAULT_LOG_LEVEL,
            description: "logging level (supported levels: panic, fatal, error, warn, info, debug, trace)",
        },
        ParamDef {
            param: Param::RelativePath,
            long: "--rpath",
            short: None,
            env_var: Some("REMEXEC_RPATH"),
            default: "",
            description: "relative path into project",
        },
        ParamDef {
            param: Param::SdkId,
            long: "--sdkid",
            short: None,
            env_var: Some("REMEXEC_SDK_ID"),
            default: "",
            description: "cross SDK ID to use to build project",
        },
        ParamDef {
            param: Param::Timestamp,
            long: "--timestamp",
            short: Some("--ts"),
            env_var: Some("REMEXEC_TIMESTAMP"),
            default: "",
            description: "prefix output with timestamp",
        },
        ParamDef {
            param: Param::AgentUrl,
            long: "--url",
            short: None,
            env_var: Some("REMEXEC_AGENT_URL"),
            default: DEFAULT_AGENT_URL,
            description: "local agent url",
        },
        ParamDef {
            param: Param::CmdTimeout,
            long: "--cmd-timeout",
            short: None,
            env_var: Some("REMEXEC_CMD_TIMEOUT"),
            default: DEFAULT_CMD_TIMEOUT,
            description: "remote command timeout in seconds, enforced by the agent",
        },
        ParamDef {
            param: Param::WaitTimeout,
            long: "--wait-timeout",
            short: None,
            env_var: Some("REMEXEC_WAIT_TIMEOUT"),
            default: "",
            description: "seconds to wait for command completion (default: no limit)",
        },
    ]
}

/// Look up the definition of a parameter.
pub fn param_def(param: Param) -> ParamDef {
    param_registry()
        .into_iter()
        .find(|d| d.param == param)
        .unwrap_or_else(|| unreachable!("every Param has a registry entry"))
}

/// Environment variable name for a parameter, or "" when it has none.
pub fn env_var(param: Param) -> &'static str {
    param_def(param).env_var.unwrap_or("")
}

/// Render the "ENVIRONMENT VARIABLES" help section.
pub fn env_help() -> String {
    let mut help = String::from("ENVIRONMENT VARIABLES:");
    for def in param_registry() {
        if let Some(env) = def.env_var {
            let flags = match def.short {
                Some(short) => format!("{}, {}", def.long, short),
                None => def.long.to_string(),
            };
            help.push_str(&format!("\n  {:<22} {:<16} {}", env, flags, def.description));
        }
    }
    help.push_str(&format!(
        "\n  {:<22} {:<16} {}",
        crate::logging::LOG_FILE_ENV,
        "",
        "write logs to this file instead of stderr"
    ));
    help
}

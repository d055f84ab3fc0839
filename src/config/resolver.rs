//! Configuration resolution.
//!
//! Each parameter is looked up in a fixed order and the first non-empty
//! value wins:
//!
//! ```text
//! flag  >  env config file  >  process environment  >  default
//! ```
//!
//! The env config file behaves like a second environment layered over the
//! process one. Both layers are plain maps here; the process environment is
//! only read, never written.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::args::{param_def, Param};
use crate::config::loader::{load_env_file, ConfigError};
use crate::config::types::{Configuration, LogLevel, Resolved, Source, WrapperFlags};

/// Two-layer key/value lookup: config file over process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvLayers {
    file: HashMap<String, String>,
    process: HashMap<String, String>,
}

impl EnvLayers {
    /// Layers with only a process environment.
    pub fn new(process: HashMap<String, String>) -> Self {
        Self {
            file: HashMap::new(),
            process,
        }
    }

    /// Snapshot of the current process environment.
    pub fn from_process_env() -> Self {
        Self::new(std::env::vars().collect())
    }

    /// Put config-file values on top. Later duplicates win.
    pub fn with_file(mut self, vars: &[(String, String)]) -> Self {
        self.file.extend(vars.iter().cloned());
        self
    }

    /// First non-empty value for `key` and the layer it came from.
    pub fn lookup(&self, key: &str) -> Option<(&str, Source)> {
        let non_empty = |v: &String| !v.is_empty();
        if let Some(v) = self.file.get(key).filter(|v| non_empty(v)) {
            return Some((v.as_str(), Source::ConfigFile));
        }
        self.process
            .get(key)
            .filter(|v| non_empty(v))
            .map(|v| (v.as_str(), Source::Env))
    }
}

impl Configuration {
    /// Resolve the effective configuration.
    ///
    /// The env config file is taken from `--config`, else from the
    /// process environment. It is loaded before any lookup so its values
    /// shadow the process environment.
    pub fn resolve(flags: &WrapperFlags, process: EnvLayers) -> Result<Self, ConfigError> {
        let config_file = flags
            .config
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .or_else(|| {
                let env = param_def(Param::Config).env_var?;
                process.lookup(env).map(|(v, _)| PathBuf::from(v))
            });

        let extra_env = match &config_file {
            Some(path) => {
                let vars = load_env_file(path)?;
                debug!(path = %path.display(), count = vars.len(), "Sourced env config file");
                vars
            }
            None => Vec::new(),
        };

        let layers = process.with_file(&extra_env);
        Self::resolve_layers(flags, &layers, config_file, extra_env)
    }

    /// Resolve against already-built layers.
    pub fn resolve_layers(
        flags: &WrapperFlags,
        layers: &EnvLayers,
        config_file: Option<PathBuf>,
        extra_env: Vec<(String, String)>,
    ) -> Result<Self, ConfigError> {
        let project_id = pick(flags.project_id.as_deref(), layers, Param::ProjectId);
        let sdk_id = pick(flags.sdk_id.as_deref(), layers, Param::SdkId);
        let rpath = pick(flags.rpath.as_deref(), layers, Param::RelativePath);

        let agent_url = pick(flags.url.as_deref(), layers, Param::AgentUrl)
            .try_map(|raw| parse_agent_url(&raw))?;

        let log_level = pick(flags.log_level.as_deref(), layers, Param::LogLevel)
            .try_map(|raw| raw.parse::<LogLevel>())?;

        let timestamp = pick_bool(flags.timestamp, layers, Param::Timestamp);

        let cmd_timeout = pick(flags.cmd_timeout.as_deref(), layers, Param::CmdTimeout)
            .try_map(|raw| parse_seconds(Param::CmdTimeout, &raw))?;

        let wait_timeout = pick(flags.wait_timeout.as_deref(), layers, Param::WaitTimeout)
            .try_map(|raw| {
                if raw.is_empty() {
                    return Ok(None);
                }
                parse_seconds(Param::WaitTimeout, &raw).map(|s| Some(Duration::from_secs(s)))
            })?;

        Ok(Configuration {
            project_id,
            sdk_id,
            rpath,
            agent_url,
            log_level,
            timestamp,
            list: flags.list,
            cmd_timeout,
            wait_timeout,
            config_file,
            extra_env,
        })
    }
}

fn pick(flag: Option<&str>, layers: &EnvLayers, param: Param) -> Resolved<String> {
    if let Some(value) = flag.filter(|v| !v.is_empty()) {
        return Resolved::new(value.to_string(), Source::Flag);
    }
    let def = param_def(param);
    if let Some((value, source)) = def.env_var.and_then(|env| layers.lookup(env)) {
        return Resolved::new(value.to_string(), source);
    }
    Resolved::new(def.default.to_string(), Source::Default)
}

fn pick_bool(flag: bool, layers: &EnvLayers, param: Param) -> Resolved<bool> {
    if flag {
        return Resolved::new(true, Source::Flag);
    }
    let def = param_def(param);
    match def.env_var.and_then(|env| layers.lookup(env)) {
        Some((value, source)) => Resolved::new(is_truthy(value), source),
        None => Resolved::new(false, Source::Default),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_seconds(param: Param, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name: param_def(param).long.to_string(),
        value: raw.to_string(),
    })
}

/// Normalize an agent address into a base URL.
///
/// `http://` is assumed when no scheme is given.
pub fn parse_agent_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let with_scheme = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };
    let url = Url::parse(&with_scheme).map_err(|_| ConfigError::InvalidValue {
        name: param_def(Param::AgentUrl).long.to_string(),
        value: raw.to_string(),
    })?;
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            name: param_def(Param::AgentUrl).long.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(url)
}

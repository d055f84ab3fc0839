//! Wrapper flag definitions.
//!
//! clap only parses the wrapper-owned tokens (those before `--`). Defaults
//! and environment lookups are left to the config resolver so a flag that is
//! absent here can still be supplied by the config file or environment.

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};

use crate::args::env_help;
use crate::config::WrapperFlags;

/// Run a command on the remote build agent.
///
/// Everything after `--` is the command to execute remotely.
#[derive(Parser, Debug)]
#[command(name = "remexec", version)]
pub struct Cli {
    /// Project ID you want to build (mandatory variable)
    #[arg(long = "id", value_name = "ID")]
    pub project_id: Option<String>,

    /// Env config file to source on startup
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List existing projects
    #[arg(long, visible_alias = "ls")]
    pub list: bool,

    /// Logging level (panic, fatal, error, warn, info, debug, trace) [default: error]
    #[arg(short = 'l', long = "log", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Relative path into project
    #[arg(long, value_name = "PATH")]
    pub rpath: Option<String>,

    /// Cross SDK ID to use to build project
    #[arg(long = "sdkid", value_name = "ID")]
    pub sdk_id: Option<String>,

    /// Prefix output with timestamp
    #[arg(long, visible_alias = "ts")]
    pub timestamp: bool,

    /// Local agent url [default: localhost:8000]
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Remote command timeout in seconds [default: 60]
    #[arg(long, value_name = "SECS")]
    pub cmd_timeout: Option<String>,

    /// Seconds to wait for command completion [default: no limit]
    #[arg(long, value_name = "SECS")]
    pub wait_timeout: Option<String>,
}

impl Cli {
    /// Parse wrapper tokens; `args[0]` is the program name.
    ///
    /// `--help` and `--version` come back as errors of the matching kind,
    /// which `clap::Error::exit` prints and turns into exit code 0.
    pub fn parse_wrapper(args: &[String]) -> Result<Self, clap::Error> {
        let matches = Self::command()
            .after_help(env_help())
            .try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }

    pub fn flags(&self) -> WrapperFlags {
        WrapperFlags {
            project_id: self.project_id.clone(),
            config: self.config.clone(),
            list: self.list,
            log_level: self.log_level.clone(),
            rpath: self.rpath.clone(),
            sdk_id: self.sdk_id.clone(),
            timestamp: self.timestamp,
            url: self.url.clone(),
            cmd_timeout: self.cmd_timeout.clone(),
            wait_timeout: self.wait_timeout.clone(),
        }
    }
}
